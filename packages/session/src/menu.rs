//! Omnibar menus, placeholders, and search.

use regex::RegexBuilder;
use serde::Serialize;
use storm_impact_dataset_models::StatKey;
use storm_impact_visualization::VisualizationKind;

use crate::experts::omnibar_topics;
use crate::message::MenuAction;
use crate::stage::Stage;
use crate::storms::{StormListEntry, render_storm_name};

/// Template slot filled with the storm name (or expert topics).
pub const PLACEHOLDER: &str = "{}";

/// One selectable omnibar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    /// Display title.
    pub title: String,
    /// Action run on selection.
    pub action: MenuAction,
    /// Extra lines shown under the title.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl MenuOption {
    fn new(title: impl Into<String>, action: MenuAction) -> Self {
        Self {
            title: title.into(),
            action,
            details: Vec::new(),
        }
    }
}

/// What the stage menus are built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuContext<'a> {
    /// Selected storm identifier.
    pub storm_name: &'a str,
    /// Cached storm list.
    pub storms: &'a [StormListEntry],
    /// Whether impact records are loaded.
    pub has_data: bool,
    /// Whether the expert layer is shown.
    pub experts_enabled: bool,
    /// Selected statistic.
    pub stat_key: Option<StatKey>,
}

/// Replaces the first placeholder in `template`.
#[must_use]
pub fn fill(template: &str, value: &str) -> String {
    template.replacen(PLACEHOLDER, value, 1)
}

/// Omnibar placeholder text of a stage. Empty for stages without one.
#[must_use]
pub fn placeholder(stage: Stage, storm_name: &str) -> String {
    let template = match (stage.main, stage.sub) {
        (0, _) => "Select Scenario Below...",
        (1, _) => "Type or Select a Storm...",
        (2, 0) => "The Consequential Impact by {}...",
        (2, 1) => "Draw Approximate Hurricane Impact Area...",
        (3, _) => "More Details about {}...",
        _ => "",
    };
    fill(template, &render_storm_name(storm_name, false))
}

fn navigation() -> [MenuOption; 2] {
    [
        MenuOption::new("⬅️ Go Back", MenuAction::Back),
        MenuOption::new("🏠 Home", MenuAction::Home),
    ]
}

/// Menu of a stage.
#[must_use]
pub fn menu_options(stage: Stage, ctx: &MenuContext<'_>) -> Vec<MenuOption> {
    let name = render_storm_name(ctx.storm_name, false);

    let mut options = match (stage.main, stage.sub) {
        (0, _) => vec![
            MenuOption::new("Upcoming Hurricane", MenuAction::UpcomingHurricane),
            MenuOption::new("Historical Storms", MenuAction::HistoricalStorms),
        ],
        (1, _) => ctx
            .storms
            .iter()
            .map(|storm| MenuOption {
                title: storm.title.clone(),
                action: MenuAction::SelectStorm {
                    storm: storm.name.clone(),
                },
                details: storm.summary_lines(),
            })
            .collect(),
        (2, 0) => {
            let mut options = vec![
                MenuOption::new(
                    "Show the Consequential Impact by {}",
                    MenuAction::ShowImpact,
                ),
                MenuOption::new(
                    "Show the Storms near the Landfall Location of {} (not yet available)",
                    MenuAction::ShowNearbyStorms,
                ),
            ];
            options.extend(navigation());
            options
        }
        (2, 1) => {
            let mut options = vec![
                MenuOption::new("Draw Approximate Hurricane Impact Area", MenuAction::DrawImpactArea),
                MenuOption::new(
                    "Show the Historical Impact Records in Drawn Area",
                    MenuAction::ShowImpact,
                ),
            ];
            options.extend(navigation());
            options
        }
        (3, _) => impact_options(ctx),
        _ => Vec::new(),
    };

    for option in &mut options {
        option.title = fill(&option.title, &name);
    }
    options
}

fn impact_options(ctx: &MenuContext<'_>) -> Vec<MenuOption> {
    let mut options: Vec<MenuOption> = if ctx.has_data {
        VisualizationKind::all()
            .iter()
            .map(|kind| {
                MenuOption::new(
                    format!("🌎 Visualize the Impact of {{}} with a {}.", kind.name()),
                    MenuAction::Visualize { kind: *kind },
                )
            })
            .collect()
    } else {
        Vec::new()
    };

    if ctx.experts_enabled {
        options.push(MenuOption::new("📚 Show List of Experts", MenuAction::ShowExpertList));
        options.push(MenuOption::new("📚 Hide Expert Layer", MenuAction::HideExperts));
    } else {
        let topics = omnibar_topics(ctx.stat_key);
        options.push(MenuOption::new(
            fill("📚 Find Related Experts with Expertise of {}", &topics),
            MenuAction::FindExperts,
        ));
    }

    options.extend(navigation());
    options
}

/// Options whose title contains `query`, ignoring case. An empty query
/// matches everything.
#[must_use]
pub fn search<'a>(options: &'a [MenuOption], query: &str) -> Vec<&'a MenuOption> {
    if query.is_empty() {
        return options.iter().collect();
    }

    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => options.iter().filter(|o| re.is_match(&o.title)).collect(),
        Err(e) => {
            log::warn!("Invalid search query '{query}': {e}");
            Vec::new()
        }
    }
}
