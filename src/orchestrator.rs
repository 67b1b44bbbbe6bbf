use crate::error::{FetchError, FixError};
use crate::llm::CompletionProvider;
use crate::prompt::build_prompt;
use crate::source;
use crate::sonar::FindingsSource;
use crate::types::{Finding, FindingKind};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info, trace};

/// What happened to a single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// The model's output was written over the file
    Applied { path: String },
    /// Prompt built but nothing sent or written
    DryRun { path: String },
}

/// Result of processing every finding of one kind
#[derive(Debug)]
pub enum PassOutcome {
    FetchFailed(FetchError),
    Empty,
    Processed {
        fixed: usize,
        failed: usize,
        skipped: usize,
    },
}

impl fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassOutcome::FetchFailed(e) => write!(f, "fetch failed ({})", e),
            PassOutcome::Empty => write!(f, "nothing to fix"),
            PassOutcome::Processed {
                fixed,
                failed,
                skipped,
            } => write!(f, "{} fixed, {} failed, {} skipped", fixed, failed, skipped),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub issues: PassOutcome,
    pub hotspots: PassOutcome,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issues: {}; hotspots: {}", self.issues, self.hotspots)
    }
}

/// Drives one fix pass: fetch findings, ask for fixes, write them back
pub struct Fixer<S: FindingsSource, P: CompletionProvider> {
    source: S,
    provider: P,
    source_root: PathBuf,
    dry_run: bool,
}

impl<S: FindingsSource, P: CompletionProvider> Fixer<S, P> {
    pub fn new(source: S, provider: P, source_root: PathBuf, dry_run: bool) -> Self {
        Self {
            source,
            provider,
            source_root,
            dry_run,
        }
    }

    /// Fix all issues, then all hotspots
    pub async fn run(&self) -> RunSummary {
        let issues = self.source.fetch_issues().await;
        let issues = self.fix_all(FindingKind::Issue, issues).await;

        let hotspots = self.source.fetch_hotspots().await;
        let hotspots = self.fix_all(FindingKind::Hotspot, hotspots).await;

        RunSummary { issues, hotspots }
    }

    async fn fix_all(
        &self,
        kind: FindingKind,
        fetched: Result<Vec<Finding>, FetchError>,
    ) -> PassOutcome {
        let findings = match fetched {
            Ok(findings) => findings,
            Err(e) => {
                error!("Failed to fetch {}s: {}", kind, e);
                return PassOutcome::FetchFailed(e);
            }
        };

        info!("Total {}s found: {}", kind, findings.len());
        if findings.is_empty() {
            return PassOutcome::Empty;
        }

        let mut fixed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for finding in &findings {
            let kind = finding.kind();
            info!("Fixing {} {}: {}", kind, finding.key(), finding.message());
            match self.fix_finding(finding).await {
                Ok(FixOutcome::Applied { path }) => {
                    info!("Fixing {} completed. Wrote {}", kind, path);
                    fixed += 1;
                }
                Ok(FixOutcome::DryRun { path }) => {
                    info!("Dry run: would rewrite {}", path);
                    skipped += 1;
                }
                Err(e) => {
                    error!("Failed to fix {} {}: {}", kind, finding.key(), e);
                    failed += 1;
                }
            }
        }

        PassOutcome::Processed {
            fixed,
            failed,
            skipped,
        }
    }

    /// Fix a single finding; the file is only written when the model returned content
    pub async fn fix_finding(&self, finding: &Finding) -> Result<FixOutcome, FixError> {
        let path = finding.path()?;
        let numbered = source::read_numbered(&self.source_root, path).await?;
        let prompt = build_prompt(finding, &numbered);
        trace!("Prompt for {}:\n{}", finding.key(), prompt);

        if self.dry_run {
            return Ok(FixOutcome::DryRun {
                path: path.to_string(),
            });
        }

        debug!(
            "Requesting fix for lines {}-{} of {}",
            finding.line_range().start_line,
            finding.line_range().end_line,
            path
        );
        let fixed = self.provider.complete(&prompt).await?;
        source::write_all(&self.source_root, path, &fixed).await?;

        Ok(FixOutcome::Applied {
            path: path.to_string(),
        })
    }
}
