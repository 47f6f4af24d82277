use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use log::info;

use slotdb::buffer::BufferPoolManager;
use slotdb::common::DEFAULT_BUFFER_POOL_SIZE;
use slotdb::storage::disk::DiskManager;
use slotdb::table::Table;
use slotdb::tuple::{DataType, Schema, Value};
use slotdb::Result;

const ROW_COUNT: i32 = 200;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| "demo.db".to_string());
    let pool_size = match args.next().map(|s| s.parse::<usize>()) {
        None => DEFAULT_BUFFER_POOL_SIZE,
        Some(Ok(n)) if n > 0 => n,
        Some(_) => {
            eprintln!("usage: slotdb [DB_PATH] [POOL_SIZE]");
            process::exit(2);
        }
    };

    // The demo deletes its file when done, so it only ever works on a new one.
    if Path::new(&db_path).exists() {
        eprintln!("refusing to overwrite existing file {}", db_path);
        process::exit(2);
    }

    if let Err(e) = run(&db_path, pool_size) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(db_path: &str, pool_size: usize) -> Result<()> {
    println!("slotdb - slotted-page storage engine demo");
    println!("==========================================\n");

    let schema = Arc::new(
        Schema::builder()
            .column("id", DataType::Integer)
            .column("name", DataType::VarChar(64))
            .column("active", DataType::Boolean)
            .build(),
    );

    let first_page_id = {
        let disk_manager = Arc::new(DiskManager::new(db_path)?);
        let bpm = Arc::new(BufferPoolManager::new(pool_size, disk_manager));
        println!("Created buffer pool with {} frames over {}", pool_size, db_path);

        let mut users = Table::create("users", Arc::clone(&schema), Arc::clone(&bpm))?;

        let mut victim = None;
        for i in 0..ROW_COUNT {
            let name = format!("user-{:04}-{}", i, "x".repeat(40));
            let row = [Value::Integer(i), Value::from(name), Value::Boolean(i % 3 == 0)];
            let rid = users.insert(&row)?;
            if i == ROW_COUNT / 2 {
                victim = Some(rid);
            }
        }
        println!(
            "Inserted {} rows across pages {} .. {}",
            ROW_COUNT,
            users.first_page_id(),
            users.heap().last_page_id()
        );

        if let Some(rid) = victim {
            users.delete(rid)?;
            println!("Deleted row at {}", rid);
        }

        let live = users.scan().collect::<Result<Vec<_>>>()?;
        println!("Scan found {} live rows", live.len());

        bpm.flush_all_pages()?;
        info!(
            "flushed; disk reads={} writes={}",
            bpm.disk_manager().num_reads(),
            bpm.disk_manager().num_writes()
        );

        users.first_page_id()
    };

    // Reopen with a fresh buffer pool and walk the chain from disk.
    let disk_manager = Arc::new(DiskManager::new(db_path)?);
    println!("\nReopened {} with {} pages", db_path, disk_manager.num_pages());
    let bpm = Arc::new(BufferPoolManager::new(pool_size, disk_manager));
    let users = Table::open("users", schema, bpm, first_page_id)?;

    let mut count = 0;
    for row in users.scan() {
        let (rid, tuple) = row?;
        if count < 3 {
            let values: Vec<String> = tuple.values().iter().map(|v| v.to_string()).collect();
            println!("  {} -> ({})", rid, values.join(", "));
        }
        count += 1;
    }
    println!("Rescan after reopen found {} live rows", count);

    std::fs::remove_file(db_path)?;
    println!("\nDemo completed successfully!");
    Ok(())
}
