//! Talk script construction.

use crate::config::VoiceProvider;
use avatalk_types::ScriptType;
use serde::Serialize;

/// The `script` object of a talk-stream call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalkScript {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<VoiceProvider>,
}

/// Builds the script for a talk call.
///
/// Only `text` scripts carry a voice provider; audio scripts are played
/// without synthesis.
pub fn build_script(text: &str, script_type: ScriptType, voice: &VoiceProvider) -> TalkScript {
    let provider = match script_type {
        ScriptType::Text => Some(voice.clone()),
        ScriptType::Audio => None,
    };

    TalkScript {
        script_type,
        input: text.to_string(),
        provider,
    }
}
