use crate::config::Config;
use crate::core::Dispatcher;
use crate::errors::AppResult;
use crate::transport::{LogTransport, NotificationTransport, SpoolTransport};
use crate::ui::messages::{success, warning};
use crate::utils::path::expand_tilde;

use super::{Output, open_db};

fn transport(cfg: &Config) -> Box<dyn NotificationTransport> {
    match &cfg.notify.spool_dir {
        Some(dir) => Box::new(SpoolTransport::new(expand_tilde(dir), cfg.notify.from_addr.clone())),
        None => Box::new(LogTransport),
    }
}

pub fn handle(cfg: &Config, out: Output) -> AppResult<()> {
    let db = open_db(cfg)?;

    let dispatcher = Dispatcher::new(transport(cfg)).with_subject_prefix(cfg.notify.subject_prefix.clone());
    let report = dispatcher.dispatch_pending_inactivity_alerts(&db.conn)?;

    if out.is_json() {
        return out.json(&report);
    }
    if report.recipients == 0 {
        warning("No admin recipients: inactivity alerts left pending.");
        return Ok(());
    }
    success(format!(
        "Alerts: {} pending, {} sent, {} failed, {} marked notified",
        report.pending, report.sent, report.send_failures, report.marked
    ));
    if report.mark_failures > 0 {
        warning(format!("{} events could not be marked notified", report.mark_failures));
    }
    Ok(())
}
