use crate::context::OperationContext;
use crate::notifications::{Notification, NotificationPayload, Recipients, SpeechType};
use crate::operations::{require_creature, SpeechArguments};
use crate::scheduler::ExecutionError;

/// Tiles a whisper carries
pub const WHISPER_RANGE: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOperation {
    arguments: SpeechArguments,
}

impl SpeechOperation {
    pub(crate) fn new(arguments: SpeechArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &SpeechArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let args = &self.arguments;
        let speaker = require_creature(context, args.requestor_id)?;
        let location = speaker.location();
        let name = speaker.name().to_string();

        let (recipients, text) = match args.speech_type {
            SpeechType::Say => (Recipients::Spectators(location), args.text.clone()),
            SpeechType::Whisper => (
                Recipients::Nearby {
                    location,
                    range: WHISPER_RANGE,
                },
                args.text.clone(),
            ),
            SpeechType::Yell => (Recipients::Spectators(location), args.text.to_uppercase()),
        };

        context.notify(Notification::new(
            recipients,
            NotificationPayload::CreatureSpoke {
                creature: args.requestor_id,
                name,
                speech_type: args.speech_type,
                text,
            },
        ));
        Ok(())
    }
}
