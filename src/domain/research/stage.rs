//! Stage contracts of the research pipeline

use std::fmt::Debug;

use async_trait::async_trait;

use super::error::{StageFailure, StageWarning};
use super::plan::{PriorContext, ResearchPlan, SourceBounds};
use super::query::Query;
use super::report::Report;
use super::source::SourceSet;

/// Input to the planning stage
#[derive(Debug, Clone)]
pub struct PlanningInput {
    pub query: Query,
    pub prior: Option<PriorContext>,
    pub bounds: SourceBounds,
}

/// Input to the retrieval stage
#[derive(Debug, Clone)]
pub struct RetrievalInput {
    pub query: Query,
    pub plan: ResearchPlan,
}

/// Sources plus any degradations absorbed while retrieving them
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutput {
    pub sources: SourceSet,
    pub warnings: Vec<StageWarning>,
}

/// Input to the synthesis stage
#[derive(Debug, Clone)]
pub struct SynthesisInput {
    pub query: Query,
    pub sources: SourceSet,
    pub prior_findings: Vec<String>,
}

/// Turns a query into a research plan
#[async_trait]
pub trait ResearchPlanner: Send + Sync + Debug {
    async fn plan(&self, input: &PlanningInput) -> Result<ResearchPlan, StageFailure>;
}

/// Gathers credibility-filtered sources for a plan
#[async_trait]
pub trait SourceRetriever: Send + Sync + Debug {
    async fn retrieve(&self, input: &RetrievalInput) -> Result<RetrievalOutput, StageFailure>;
}

/// Writes a report from retrieved sources
#[async_trait]
pub trait ReportSynthesizer: Send + Sync + Debug {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Report, StageFailure>;
}

#[cfg(test)]
pub mod mock {
    //! Scripted stage implementations

    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::research::{Provenance, Source};
    use crate::domain::search::RawSearchResult;

    /// Planner returning a fixed plan or failure
    #[derive(Debug)]
    pub struct MockPlanner {
        plan: Option<ResearchPlan>,
        inputs: Mutex<Vec<PlanningInput>>,
    }

    impl MockPlanner {
        pub fn returning(plan: ResearchPlan) -> Self {
            Self {
                plan: Some(plan),
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                plan: None,
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn inputs(&self) -> Vec<PlanningInput> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResearchPlanner for MockPlanner {
        async fn plan(&self, input: &PlanningInput) -> Result<ResearchPlan, StageFailure> {
            self.inputs.lock().unwrap().push(input.clone());
            self.plan
                .clone()
                .ok_or_else(|| StageFailure::planning("planner model unreachable"))
        }
    }

    /// Retriever producing `count` deterministic sources per call
    #[derive(Debug)]
    pub struct MockRetriever {
        provenance: Provenance,
        fail: bool,
        delay: Option<Duration>,
    }

    impl MockRetriever {
        pub fn live() -> Self {
            Self {
                provenance: Provenance::Live,
                fail: false,
                delay: None,
            }
        }

        pub fn synthetic() -> Self {
            Self {
                provenance: Provenance::Synthetic,
                ..Self::live()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::live()
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl SourceRetriever for MockRetriever {
        async fn retrieve(&self, input: &RetrievalInput) -> Result<RetrievalOutput, StageFailure> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail {
                return Err(StageFailure::retrieval("no sources could be retrieved"));
            }

            let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let count = input.plan.target_source_count();
            let candidates = (0..count)
                .map(|i| {
                    let raw = RawSearchResult::new(
                        format!("{} - Source {}", input.query, i + 1),
                        format!(
                            "https://source{}.example.org/{}",
                            i,
                            input.plan.focus_areas().len()
                        ),
                        format!("Snippet {} about {}", i + 1, input.query),
                        i,
                    );
                    Source::admit(&raw, 1.0 - i as f32 * 0.05, self.provenance, at).unwrap()
                })
                .collect();

            Ok(RetrievalOutput {
                sources: SourceSet::from_candidates(candidates, count),
                warnings: Vec::new(),
            })
        }
    }

    /// Synthesizer returning a canned report or failure
    #[derive(Debug)]
    pub struct MockSynthesizer {
        fail: bool,
        inputs: Mutex<Vec<SynthesisInput>>,
    }

    impl MockSynthesizer {
        pub fn working() -> Self {
            Self {
                fail: false,
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn inputs(&self) -> Vec<SynthesisInput> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportSynthesizer for MockSynthesizer {
        async fn synthesize(&self, input: &SynthesisInput) -> Result<Report, StageFailure> {
            self.inputs.lock().unwrap().push(input.clone());

            if self.fail {
                return Err(StageFailure::synthesis("synthesizer model unreachable"));
            }

            Ok(Report::new(
                format!("Summary of {}", input.query),
                vec![format!("Finding about {}", input.query)],
                "Conclusion",
                &input.sources,
            ))
        }
    }
}
