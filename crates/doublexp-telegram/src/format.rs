//! Alert text rendering.
//!
//! Mission alerts use Telegram MarkdownV2. Emphasis is a pair of asterisks
//! around an escaped span, and every literal and every mission field goes
//! through [`escape`], so text from the endpoint can never unbalance the
//! markup. Status replies (no missions, errors, welcome) are plain text.

use doublexp_core::AlertConfig;
use doublexp_models::Mission;
use teloxide::utils::markdown::{bold, escape};

/// Title used on plain status replies.
pub const BOT_TITLE: &str = "Deep Rock Galactic Alerts";

/// Which window an alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Missions running now; the figure is minutes left in the window.
    Current,
    /// Missions of the next window; the figure is minutes until it starts.
    Upcoming,
}

/// Renders missions and status replies.
#[derive(Debug, Clone)]
pub struct AlertFormatter {
    mutator: String,
    season_marker: String,
    signature: String,
}

impl AlertFormatter {
    pub fn new(
        mutator: impl Into<String>,
        season_marker: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            mutator: mutator.into(),
            season_marker: season_marker.into(),
            signature: signature.into(),
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(
            config.mutator.clone(),
            config.season_marker.clone(),
            config.base_url.clone(),
        )
    }

    /// Renders one mission block, terminated by a newline.
    ///
    /// The header gets a "(past season)" suffix when the mission is not part
    /// of the running season.
    pub fn format_mission(&self, mission: &Mission) -> String {
        let mut header = bold(&escape(&format!("{}: {}", mission.biome, mission.code_name)));
        if !mission.in_season(&self.season_marker) {
            header.push_str(&escape(" (past season)"));
        }

        let mut desc = format!(
            "{}\nCave: {}\nLength: {}\nObjectives:\n{}\n{}\n",
            header,
            bold(&escape(&mission.complexity)),
            bold(&escape(&mission.length)),
            list_item(&mission.primary_objective),
            list_item(&mission.secondary_objective),
        );

        if mission.has_warnings() {
            desc.push_str("Warnings:\n");
            for warning in &mission.warnings {
                desc.push_str(&list_item(warning));
                desc.push('\n');
            }
        }
        desc
    }

    /// Renders a full alert: header sentence, then mission blocks separated
    /// by blank lines.
    pub fn format_alert(&self, missions: &[Mission], minutes: i64, kind: AlertKind) -> String {
        let plural = missions.len() > 1;
        let mutator = bold(&escape(&self.mutator));
        let noun = if plural { "missions" } else { "mission" };

        let header = match kind {
            AlertKind::Current => format!(
                "{} {} for next {} minutes {}:",
                mutator,
                noun,
                bold(&escape(&minutes.to_string())),
                if plural { "are" } else { "is" },
            ),
            AlertKind::Upcoming => format!(
                "{} {} in {} minutes{}",
                mutator,
                noun,
                escape(&minutes.to_string()),
                escape(". Ready up miners!"),
            ),
        };

        let blocks: Vec<String> = missions.iter().map(|m| self.format_mission(m)).collect();
        format!("{}\n\n{}", header, blocks.join("\n"))
    }

    /// Plain reply when the current window has no target missions.
    pub fn no_missions(&self) -> String {
        self.sign(format!("No {} missions at the moment.", self.mutator))
    }

    /// Plain reply when mission data could not be fetched.
    pub fn fetch_failed(&self) -> String {
        self.sign(format!("Error while fetching {} missions data.", self.mutator))
    }

    /// Plain welcome for a new subscriber.
    pub fn welcome(&self) -> String {
        format!(
            "{}.\n\nWelcome miner!\nYou'll be notified of {} missions upcoming.",
            BOT_TITLE, self.mutator
        )
    }

    /// Plain reply when the subscription could not be stored.
    pub fn registration_failed(&self) -> String {
        format!(
            "{}.\n\nChat registration error. Give it another try later.",
            BOT_TITLE
        )
    }

    /// Plain confirmation after unsubscribing.
    pub fn unsubscribed(&self) -> String {
        format!(
            "{}.\n\nYou won't receive {} alerts anymore. Send /start to subscribe again.",
            BOT_TITLE, self.mutator
        )
    }

    /// Plain reply when the subscription could not be removed.
    pub fn unsubscribe_failed(&self) -> String {
        format!(
            "{}.\n\nCouldn't unsubscribe this chat. Give it another try later.",
            BOT_TITLE
        )
    }

    fn sign(&self, message: String) -> String {
        format!("{}\n\n{}", message, self.signature)
    }
}

fn list_item(text: &str) -> String {
    format!("  {} {}", escape("-"), bold(&escape(text)))
}
