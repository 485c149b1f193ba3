// ScannerDB command line shell
//
// Usage: scannerdb <hpdb-dir> [favorites-dir]
//
// Imports an HPDB directory (hpdb.cfg + s_*.hpd) and optionally a
// favorites directory (f_list.cfg + f_*.hpd), then prints the import
// summaries as JSON.

use std::path::Path;
use std::process::ExitCode;

use scannerdb_lib::favorites::model::FavoritesList;
use scannerdb_lib::hpdb::model::HpdbDatabase;
use scannerdb_lib::import::{ImportOptions, ImportRunner};
use scannerdb_lib::record::store::StructuredRecordStore;

fn main() -> ExitCode {
    // Default to info level for our crate.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("scannerdb=info"),
    )
    .init();

    let args: Vec<String> = std::env::args().collect();
    let hpdb_dir = match args.get(1) {
        Some(dir) => dir.clone(),
        None => {
            eprintln!("usage: scannerdb <hpdb-dir> [favorites-dir]");
            return ExitCode::FAILURE;
        }
    };
    let favorites_dir = args.get(2).cloned();

    let mut db = HpdbDatabase::new();
    let mut store = StructuredRecordStore::new();
    let mut runner = ImportRunner::new();
    runner.set_progress(Box::new(|update| {
        log::info!(
            "[{}] {} ({}/{})",
            update.stage.as_str(),
            update.current_file,
            update.processed_files,
            update.total_files
        );
    }));

    let summary = match runner.run_hpdb_directory(
        Path::new(&hpdb_dir),
        &mut db,
        &mut store,
        &ImportOptions::default(),
    ) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("HPDB import failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{}",
        serde_json::json!({
            "hpdb": {
                "cancelled": summary.cancelled,
                "files_processed": summary.files_processed,
                "created": summary.created_counts(),
                "entities": db.entity_counts(),
            }
        })
    );

    if let Some(favorites_dir) = favorites_dir {
        let mut lists: Vec<FavoritesList> = Vec::new();
        let summary = match runner.run_favorites_directory(
            Path::new(&favorites_dir),
            &mut lists,
            &mut store,
        ) {
            Ok(summary) => summary,
            Err(e) => {
                log::error!("favorites import failed: {}", e);
                return ExitCode::FAILURE;
            }
        };
        println!(
            "{}",
            serde_json::json!({
                "favorites": {
                    "cancelled": summary.cancelled,
                    "files_processed": summary.files_processed,
                    "lists": lists.len(),
                    "created": summary.created_counts(),
                }
            })
        );
    }

    ExitCode::SUCCESS
}
