//! Scripted advocates: canned argument text per side and round.
//!
//! Every line is inside the default length limits, avoids the default
//! denylist and shares few words with its neighbours, so the validator
//! admits a full script.

use std::sync::Arc;
use std::time::Duration;

use adjudication::case::{ArgumentSubmission, Side};
use adjudication::collaborators::QueuedArgumentSource;
use tokio::task::JoinHandle;
use tracing::debug;

const PLAINTIFF_SCRIPT: [&str; 6] = [
    "The defendant shipped an unaudited bridge contract and ignored three separate reports.",
    "Logs from the incident show user funds stuck for nine days before anyone replied.",
    "Their own changelog admits the fix landed a week after the exploit became public.",
    "Independent researchers flagged the same flaw twice and got no acknowledgement at all.",
    "A responsible team pauses deposits immediately; this one kept taking new money.",
    "Nothing in the record explains why the warning banner stayed hidden from users.",
];

const DEFENDANT_SCRIPT: [&str; 6] = [
    "Every report was triaged within a day and the flagged paths were patched before launch.",
    "Funds were never at risk because the timelock blocked withdrawals during the review period.",
    "The public changelog lists the mitigation date, which predates any known exploit attempt.",
    "Researchers received bounty payouts, and their emails are archived in our tracker.",
    "Deposits stayed open since the vulnerable module was already disabled by governance vote.",
    "A banner was published on the status page and pinned in every community channel.",
];

/// Produces one side's arguments.
#[derive(Debug, Clone)]
pub struct ScriptedAdvocate {
    pub side: Side,
    pub name: String,
    script: &'static [&'static str],
}

impl ScriptedAdvocate {
    pub fn new(side: Side, name: &str) -> Self {
        let script: &'static [&'static str] = match side {
            Side::Plaintiff => &PLAINTIFF_SCRIPT,
            Side::Defendant => &DEFENDANT_SCRIPT,
        };
        Self {
            side,
            name: name.to_string(),
            script,
        }
    }

    /// Text for a 1-based round. Cycles once the script runs out.
    pub fn argument(&self, round: u32) -> &'static str {
        let index = (round.max(1) as usize - 1) % self.script.len();
        self.script[index]
    }

    pub fn submission(&self, round: u32) -> ArgumentSubmission {
        let confidence = 0.6 + 0.05 * f64::from(round % 4);
        ArgumentSubmission::new(self.side, self.argument(round), confidence).for_round(round)
    }
}

/// Feed `rounds` rounds of alternating submissions into `queue`.
pub fn spawn_advocates(
    queue: Arc<QueuedArgumentSource>,
    case_id: String,
    plaintiff: ScriptedAdvocate,
    defendant: ScriptedAdvocate,
    rounds: u32,
    pace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let sender = queue.sender(&case_id);
        for round in 1..=rounds {
            for advocate in [&plaintiff, &defendant] {
                if !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
                debug!(case_id = %case_id, round, side = %advocate.side, "advocate submitting");
                if sender.send(advocate.submission(round)).is_err() {
                    return;
                }
            }
        }
    })
}
