//! Console progress reporting for the binary.

use async_trait::async_trait;
use essayflow::core::StageKind;
use essayflow::events::{self, event_stage, EventSink};

/// Prints one line per stage start and per saved file.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn line(event_type: &str, data: Option<&serde_json::Value>) -> Option<String> {
        let stage = event_stage(data)?;

        match event_type {
            events::STAGE_STARTED => Some(match stage {
                StageKind::Generate => "Step 1: Generating essay...".to_string(),
                StageKind::Review => "Step 2: Reviewing essay...".to_string(),
                StageKind::Revise => "Step 3: Updating essay with feedback...".to_string(),
            }),
            events::ARTIFACT_SAVED => {
                let path = data?.get("path")?.as_str()?;
                let label = match stage {
                    StageKind::Generate => "Essay",
                    StageKind::Review => "Feedback",
                    StageKind::Revise => "Updated essay",
                };
                Some(format!("{label} saved to: {path}\n"))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl EventSink for ConsoleProgress {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.try_emit(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        if let Some(line) = Self::line(event_type, data.as_ref()) {
            println!("{line}");
        }
    }
}
