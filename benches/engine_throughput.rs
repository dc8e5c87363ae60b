use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Error;
use benchmark_rs::benchmarks::Benchmarks;
use benchmark_rs::stopwatch::StopWatch;
use simple_logger::SimpleLogger;

use merge_index::{EngineHandle, EngineOptions};

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Clone)]
struct BenchmarkConfig {
    bench_dir: PathBuf,
    puts_per_bucket: usize,
    buckets: usize,
}

fn put_and_merge(stop_watch: &mut StopWatch, config: BenchmarkConfig, work: usize) -> Result<(), Error> {
    stop_watch.pause();
    let root = config.bench_dir.join(format!("shard-{work}"));
    let options = EngineOptions::new()
        .with_checkpoint_interval(Duration::from_millis(20))
        .with_merge_interval(Duration::from_millis(50));
    log::info!("Start put_and_merge against {}", root.to_string_lossy());
    stop_watch.resume();

    let engine = EngineHandle::start(&root, options)?;
    for bucket in 0..config.buckets {
        for value in 0..config.puts_per_bucket {
            engine.put(format!("bucket-{bucket}").as_bytes(), format!("v{value}").as_bytes(), b"")?;
        }
    }
    // give the background merge a chance to absorb everything before shutdown.
    std::thread::sleep(Duration::from_millis(500));
    engine.shutdown()?;

    stop_watch.pause();
    log::info!("Finish put_and_merge against {}", root.to_string_lossy());
    Ok(())
}

#[test]
fn engine_throughput_bench() -> Result<(), Error> {
    SimpleLogger::new().init().unwrap();
    log::info!("Started engine_throughput_bench.");

    let bench_dir = PathBuf::from("./target/benchmarks/merge_index");
    if bench_dir.exists() {
        fs::remove_dir_all(&bench_dir)?;
    }
    fs::create_dir_all(&bench_dir)?;

    let mut benchmarks = Benchmarks::new("merge_index-throughput");

    benchmarks.add(
        "small-index-few-buckets",
        put_and_merge,
        BenchmarkConfig { bench_dir: bench_dir.clone(), puts_per_bucket: 1_000, buckets: 4 },
        vec![0, 1, 2],
        3,
        0,
    )?;

    benchmarks.add(
        "larger-index-many-buckets",
        put_and_merge,
        BenchmarkConfig { bench_dir: bench_dir.clone(), puts_per_bucket: 200, buckets: 64 },
        vec![0, 1, 2],
        3,
        0,
    )?;

    benchmarks.run()?;
    benchmarks.save_to_csv(PathBuf::from("./target/benchmarks/"), true, true)?;
    benchmarks.save_to_json(PathBuf::from("./target/benchmarks/"))?;

    log::info!("Finished engine_throughput_bench.");
    Ok(())
}
