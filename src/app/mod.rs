pub mod pipelines;
pub mod report;

use crate::utils::error::EtlError;

/// Logs `e` with its category, prints the user-facing message and exits with
/// the code for its severity.
pub fn exit_with(context: &str, e: EtlError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code())
}
