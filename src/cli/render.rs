use crate::domain::OutboundEvent;

/// One terminal line per archiver event.
pub fn render_event(event: &OutboundEvent) -> String {
    match event {
        OutboundEvent::UpdateProgress(progress) => {
            format!("[{:>3.0}%] {}", progress.percentage(), progress.message)
        }
        OutboundEvent::ProcessComplete { message } => format!("✅ {message}"),
        OutboundEvent::ProcessError { error } => format!("❌ {error}"),
    }
}
