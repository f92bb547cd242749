use anyhow::*;
use clap::Parser;
use mrtask::naming::{clean_intermediate_files, output_path};
use mrtask::standalone::{engine::run_job_traced, Args, Commands, Job};
use mrtask::*;
use tracing_subscriber::EnvFilter;

fn init_log() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_log();
    let args = Args::parse();
    let work_dir = args.work_dir;

    match args.command {
        Commands::Run {
            job,
            input,
            workload,
            n_reduce,
            keep,
        } => {
            let job = Job {
                name: job,
                input,
                workload,
                work_dir,
                n_reduce,
                clean: !keep,
            };
            let report = run_job_traced(&job).await?;
            println!("{}", report.merged.display());
        }
        Commands::Map {
            job,
            workload,
            task,
            input,
            n_reduce,
        } => {
            let engine = workload::named(&workload)?;
            let ctx = TaskContext::with_tracing(work_dir);
            let summary = do_map(&ctx, &job, task, &input, n_reduce, engine.map_fn)?;
            for file in summary.files {
                println!("{}", file.display());
            }
        }
        Commands::Reduce {
            job,
            workload,
            task,
            n_map,
            output,
        } => {
            let engine = workload::named(&workload)?;
            let out_file = output.unwrap_or_else(|| output_path(&work_dir, &job, task));
            let ctx = TaskContext::with_tracing(work_dir);
            let summary = do_reduce(&ctx, &job, task, &out_file, n_map, engine.reduce_fn)?;
            println!("{}", summary.out_file.display());
        }
        Commands::Merge { job, n_reduce } => {
            let merged = merge::merge_outputs(&work_dir, &job, n_reduce)?;
            println!("{}", merged.display());
        }
        Commands::Clean {
            job,
            n_map,
            n_reduce,
            outputs,
        } => {
            let removed = clean_intermediate_files(&work_dir, &job, n_map, n_reduce, outputs)?;
            println!("removed {} files", removed);
        }
    }
    Ok(())
}
