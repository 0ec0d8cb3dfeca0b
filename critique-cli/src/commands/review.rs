//! Review command - run one agent-orchestrated code review

use std::path::PathBuf;

use clap::Args;
use critique_core::{review_with_context, Config, DiffTarget, ReviewRequest, Secrets};

/// Arguments for the review command
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// What to diff: 'staged', 'unstaged', or a git ref like 'HEAD~1'
    #[arg(short = 't', long, default_value = "staged")]
    pub target: String,

    /// Extra context files to load alongside the planning documents
    #[arg(short = 'c', long = "context")]
    pub context_files: Vec<PathBuf>,

    /// Files to focus the review on
    #[arg(short = 'f', long = "focus")]
    pub focus_files: Vec<PathBuf>,

    /// What the change is trying to accomplish
    #[arg(long, default_value = "")]
    pub task: String,

    /// Working directory for the review (defaults to current directory)
    #[arg(short = 'd', long, default_value = ".")]
    pub workdir: PathBuf,
}

impl ReviewArgs {
    /// Execute the review command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        // Resolve to absolute path
        let workdir = if self.workdir.is_absolute() {
            self.workdir.clone()
        } else {
            std::env::current_dir()?.join(&self.workdir)
        };

        if verbose {
            tracing::info!(
                target = %self.target,
                workdir = %workdir.display(),
                focus = self.focus_files.len(),
                "Starting review"
            );
        }

        let request = ReviewRequest::new(workdir)
            .with_diff_target(DiffTarget::parse(&self.target))
            .with_context_files(self.context_files.clone())
            .with_focus_files(self.focus_files.clone())
            .with_task_description(self.task.clone());

        let secrets = Secrets::load()?;
        let outcome = review_with_context(&request, config, &secrets).await?;

        if !outcome.complete {
            eprintln!("warning: review is incomplete (iteration limit reached)");
            eprintln!();
        }
        println!("{}", outcome.text);

        Ok(())
    }
}
