//! Running whole jobs, or single tasks, on one machine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod engine;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// Directory holding intermediate and output files
    #[arg(short = 'd', long, env = "MRTASK_WORK_DIR", default_value = ".", global = true)]
    pub work_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a complete job: every map task, then every reduce task, then merge
    Run {
        /// Name of the job
        #[arg(short, long)]
        job: String,

        /// Glob spec for the input files, one map task per file
        #[arg(short, long)]
        input: String,

        /// Name of the workload
        #[arg(short, long)]
        workload: String,

        /// Number of reduce tasks
        #[arg(short, long, env = "MRTASK_N_REDUCE", default_value_t = 3)]
        n_reduce: u32,

        /// Keep intermediate files after the job succeeded
        #[arg(long)]
        keep: bool,
    },
    /// Run a single map task
    Map {
        #[arg(short, long)]
        job: String,
        #[arg(short, long)]
        workload: String,
        /// Index of this map task
        #[arg(short, long)]
        task: u32,
        /// Input file of this map task
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, env = "MRTASK_N_REDUCE", default_value_t = 3)]
        n_reduce: u32,
    },
    /// Run a single reduce task
    Reduce {
        #[arg(short, long)]
        job: String,
        #[arg(short, long)]
        workload: String,
        /// Index of this reduce task
        #[arg(short, long)]
        task: u32,
        /// Number of map tasks of the job
        #[arg(short = 'm', long)]
        n_map: u32,
        /// Output file, defaults to `mrtmp.<job>-res-<task>` in the work dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge the outputs of all reduce tasks into `mrtmp.<job>`
    Merge {
        #[arg(short, long)]
        job: String,
        #[arg(short, long, env = "MRTASK_N_REDUCE", default_value_t = 3)]
        n_reduce: u32,
    },
    /// Remove the intermediate files of a job
    Clean {
        #[arg(short, long)]
        job: String,
        #[arg(short = 'm', long)]
        n_map: u32,
        #[arg(short, long, env = "MRTASK_N_REDUCE", default_value_t = 3)]
        n_reduce: u32,
        /// Also remove the per-reduce outputs
        #[arg(long)]
        outputs: bool,
    },
}

/// A job to run locally.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    /// Glob spec for the input files.
    pub input: String,
    pub workload: String,
    pub work_dir: PathBuf,
    pub n_reduce: u32,
    /// Remove intermediate files once the job succeeded.
    pub clean: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run() {
        let args = Args::parse_from([
            "mrl-standalone", "run", "-j", "wcjob", "-i", "in/*.txt", "-w", "wc", "-n", "5", "-d", "/tmp/x",
        ]);
        assert_eq!(args.work_dir, PathBuf::from("/tmp/x"));
        match args.command {
            Commands::Run {
                job,
                input,
                workload,
                n_reduce,
                keep,
            } => {
                assert_eq!(job, "wcjob");
                assert_eq!(input, "in/*.txt");
                assert_eq!(workload, "wc");
                assert_eq!(n_reduce, 5);
                assert!(!keep);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn verifies() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
