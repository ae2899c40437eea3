//! Analysis request kinds and the typed inbound payload.
//!
//! Each kind carries its wire event names, the fixed instruction template
//! sent to the model, and the model variant the relay routes it to. The
//! templates and model IDs are part of the service contract and are not
//! configurable.

use serde::{Deserialize, Serialize};

/// The two analysis operations the relay supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Generate unit tests for the submitted code.
    GenerateTest,
    /// Find bugs in the submitted code and return a fixed version.
    FindBugsAndFix,
}

/// Instruction template for [`RequestKind::GenerateTest`].
const GENERATE_TEST_INSTRUCTION: &str = "Your task is to generate unit test for the provided code to test it for reliability, scalability and potential bugs to look out for. Output only the code nothing else also don't add the name of language on the top:";

/// Instruction template for [`RequestKind::FindBugsAndFix`].
const FIND_BUGS_INSTRUCTION: &str = "Your task is to find potential bugs and fix them for the provided code. Output only the code nothing else also don't add the name of language on the top:";

/// General-purpose model serving test generation.
const GENERATE_TEST_MODEL: &str = "gemini-1.0-pro";

/// Fine-tuned model serving bug finding.
const FIND_BUGS_MODEL: &str = "tunedModels/ai-test-generator-2--qjvykv8ejs6g";

impl RequestKind {
    /// All request kinds, in dispatch-table order.
    pub const ALL: [Self; 2] = [Self::GenerateTest, Self::FindBugsAndFix];

    /// Resolve an inbound event name to a request kind.
    #[must_use]
    pub fn from_request_event(event: &str) -> Option<Self> {
        match event {
            "generate-test-request" => Some(Self::GenerateTest),
            "find-bugs-and-fix-request" => Some(Self::FindBugsAndFix),
            _ => None,
        }
    }

    /// The inbound event name clients send for this kind.
    #[must_use]
    pub fn request_event(self) -> &'static str {
        match self {
            Self::GenerateTest => "generate-test-request",
            Self::FindBugsAndFix => "find-bugs-and-fix-request",
        }
    }

    /// The outbound event name the response is emitted under.
    #[must_use]
    pub fn response_event(self) -> &'static str {
        match self {
            Self::GenerateTest => "generate-test",
            Self::FindBugsAndFix => "find-bugs-and-fix",
        }
    }

    /// The fixed instruction sent as the first prompt part.
    #[must_use]
    pub fn instruction(self) -> &'static str {
        match self {
            Self::GenerateTest => GENERATE_TEST_INSTRUCTION,
            Self::FindBugsAndFix => FIND_BUGS_INSTRUCTION,
        }
    }

    /// The Gemini model variant this kind is routed to.
    #[must_use]
    pub fn model(self) -> &'static str {
        match self {
            Self::GenerateTest => GENERATE_TEST_MODEL,
            Self::FindBugsAndFix => FIND_BUGS_MODEL,
        }
    }

    /// Build the two prompt parts for a request: the instruction, then the
    /// file name and code block.
    #[must_use]
    pub fn prompt_parts(self, request: &AnalyzeRequest) -> [String; 2] {
        [
            self.instruction().to_string(),
            format!("fileName: {}\ninput: {}", request.file_name, request.input),
        ]
    }
}

/// Typed payload of an analysis request.
///
/// Both fields are required; a payload missing either is rejected at the
/// boundary rather than interpolated into the prompt as a hole.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Name of the file the code came from (free-form, shown to the model).
    pub file_name: String,
    /// The code to analyze.
    pub input: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
