#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line explorer for storm impact datasets.
//!
//! ```text
//! storm_impact summary --events katrina.json [--health health.json]
//! storm_impact summary --events counties.json --track-impacts ian.json
//! storm_impact histogram --events katrina.json [--bins 120]
//! storm_impact widgets --events katrina.json [--at 2005-08-29T12:00:00Z]
//! storm_impact choropleth --events katrina.json [--stat event_impact_deathDirectResult]
//! storm_impact layers --events katrina.json --vis hexHisto [--3d]
//! storm_impact detail --events katrina.json 22071
//! storm_impact storms
//! storm_impact menu 2-0 --storm "KATRINA 2005"
//! ```
//!
//! Every command prints JSON on stdout. Dataset commands run the records
//! through the time bar and category filters first, so `--at`,
//! `--no-accumulate`, and `--disable` narrow what the map commands see.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use storm_impact_dataset::impact_area::{CountyImpact, attach_track_times, impacted_counties};
use storm_impact_dataset::{Dataset, NormalizedRecord, sparql};
use storm_impact_dataset_models::{FieldMapping, HealthLookup, StatKey};
use storm_impact_filter::{CategoryView, CrossFilter, ScatterPlot, TimeBar, Widget};
use storm_impact_session::Stage;
use storm_impact_session::menu::{MenuContext, menu_options, placeholder};
use storm_impact_session::storms::{
    ImpactSource, StormRegistry, TrackSource, render_storm_name,
};
use storm_impact_visualization::{Choropleth, ImpactDetail, LayerArgs, VisualizationKind};

#[derive(Parser)]
#[command(name = "storm_impact", about = "Explore storm impact records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Dataset inputs and the filters applied to them.
#[derive(Args)]
struct DataArgs {
    /// Impact records (SPARQL JSON results)
    #[arg(long)]
    events: PathBuf,
    /// County health records keyed by FIPS (SPARQL JSON results)
    #[arg(long)]
    health: Option<PathBuf>,
    /// Track county impacts (`[{"time", "regions"}]`) giving county records
    /// their times
    #[arg(long)]
    track_impacts: Option<PathBuf>,
    /// Playhead time (RFC 3339). Defaults to the end of the range
    #[arg(long)]
    at: Option<String>,
    /// Only show records active at the playhead
    #[arg(long)]
    no_accumulate: bool,
    /// Hide an event type (repeatable)
    #[arg(long = "disable")]
    disabled: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record count, time range, event types and statistics
    Summary {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Active records per time bin
    Histogram {
        #[command(flatten)]
        data: DataArgs,
        /// Number of bins
        #[arg(long, default_value = "120")]
        bins: usize,
    },
    /// Rendered time bar, category and scatter plot widgets
    Widgets {
        #[command(flatten)]
        data: DataArgs,
        /// Statistic the category bars are sized by
        #[arg(long)]
        stat: Option<StatKey>,
    },
    /// County choropleth as `GeoJSON`
    Choropleth {
        #[command(flatten)]
        data: DataArgs,
        /// Statistic the counties are colored by
        #[arg(long)]
        stat: Option<StatKey>,
    },
    /// Map layers of a visualization
    Layers {
        #[command(flatten)]
        data: DataArgs,
        /// Visualization (hexHisto, heatmap, polyHisto)
        #[arg(long)]
        vis: VisualizationKind,
        /// Statistic the choropleth is colored by
        #[arg(long)]
        stat: Option<StatKey>,
        /// Extrude layers
        #[arg(long = "3d")]
        is_3d: bool,
    },
    /// Impact and health detail of one county
    Detail {
        #[command(flatten)]
        data: DataArgs,
        /// County FIPS code
        fips: String,
    },
    /// Landfall markers with their track and impact sources
    Storms,
    /// Omnibar placeholder and options of a stage
    Menu {
        /// Stage (`0`, `1`, `2`, `2-1`, `3`)
        stage: Stage,
        /// Selected storm (`"KATRINA 2005"`)
        #[arg(long, default_value = "")]
        storm: String,
    },
}

/// A loaded dataset and the filter state built from [`DataArgs`].
struct Loaded {
    dataset: Arc<Dataset>,
    time_bar: TimeBar,
    categories: CategoryView,
    filter: CrossFilter,
}

impl Loaded {
    fn open(args: &DataArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let dataset = Arc::new(match &args.track_impacts {
            Some(path) => Self::from_track_impacts(args, path)?,
            None => Dataset::from_files(&args.events, args.health.as_deref())?,
        });
        log::info!(
            "Loaded {} records from {}",
            dataset.len(),
            args.events.display()
        );

        let mut time_bar = TimeBar::new(&dataset);
        if let Some(at) = &args.at {
            time_bar.seek(DateTime::parse_from_rfc3339(at)?.timestamp_millis());
        }
        if args.no_accumulate {
            time_bar.toggle_accumulation();
        }

        let mut categories = CategoryView::new(&dataset);
        for name in &args.disabled {
            if !categories.enabled().contains_key(name) {
                log::warn!("Unknown event type '{name}'");
            }
            categories.set_enabled(name, false);
        }

        let mut filter = CrossFilter::new(Arc::clone(&dataset));
        filter.update(&time_bar);
        filter.update(&categories);
        log::debug!("{} of {} records pass the filters", filter.indices().len(), dataset.len());

        Ok(Self {
            dataset,
            time_bar,
            categories,
            filter,
        })
    }

    fn from_track_impacts(
        args: &DataArgs,
        path: &Path,
    ) -> Result<Dataset, Box<dyn std::error::Error>> {
        let impacts: Vec<CountyImpact> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let mut events = sparql::parse_bindings(&std::fs::read_to_string(&args.events)?)?;
        let health = match &args.health {
            Some(health) => sparql::parse_health_lookup(&std::fs::read_to_string(health)?)?,
            None => HealthLookup::default(),
        };

        log::info!(
            "Track touches {} counties",
            impacted_counties(&impacts).len()
        );
        let mapping = FieldMapping::default();
        attach_track_times(&mut events, &impacts, &mapping);

        Ok(Dataset::with_fields(events, &health, mapping))
    }

    fn records(&self) -> Vec<&NormalizedRecord> {
        self.filter.filtered()
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Summary { data } => {
            let loaded = Loaded::open(&data)?;
            let dataset = &loaded.dataset;
            print_json(&json!({
                "records": dataset.len(),
                "filtered": loaded.filter.indices().len(),
                "timeInfo": dataset.time_info(),
                "eventTypes": dataset.event_type_totals(),
                "stats": dataset.stats(true),
            }))?;
        }
        Commands::Histogram { data, bins } => {
            let loaded = Loaded::open(&data)?;
            print_json(&loaded.dataset.time_histogram(bins))?;
        }
        Commands::Widgets { data, stat } => {
            let mut loaded = Loaded::open(&data)?;
            loaded.categories.set_stat_key(stat);

            let mut scatter = ScatterPlot::new(&loaded.dataset);
            scatter.set_disabled_categories(
                loaded
                    .categories
                    .enabled()
                    .iter()
                    .filter(|(_, enabled)| !**enabled)
                    .map(|(name, _)| name.clone()),
            );

            let widgets: [&dyn Widget; 3] = [&loaded.time_bar, &loaded.categories, &scatter];
            let views: Vec<_> = widgets
                .iter()
                .map(|w| json!({ "title": w.title(), "view": w.render(&loaded.dataset) }))
                .collect();
            print_json(&views)?;
        }
        Commands::Choropleth { data, stat } => {
            let loaded = Loaded::open(&data)?;
            let choropleth = Choropleth::build(loaded.records(), loaded.dataset.fields(), stat);
            print_json(&choropleth.to_geojson())?;
        }
        Commands::Layers {
            data,
            vis,
            stat,
            is_3d,
        } => {
            let loaded = Loaded::open(&data)?;
            let rendered = vis.layers(
                &loaded.records(),
                loaded.dataset.fields(),
                &LayerArgs {
                    is_3d,
                    stat_key: stat,
                },
            );
            print_json(&rendered)?;
        }
        Commands::Detail { data, fips } => {
            let loaded = Loaded::open(&data)?;
            let records = loaded.records();
            let fields = loaded.dataset.fields();
            let choropleth = Choropleth::build(records.iter().copied(), fields, None);
            let Some(region) = choropleth.regions.iter().find(|r| r.key == fips) else {
                return Err(format!("No records for county '{fips}'").into());
            };

            let detail = ImpactDetail::for_region(
                region,
                records.iter().copied(),
                &fields.region_key,
                &fields.time_label,
            );
            print_json(&detail)?;
        }
        Commands::Storms => {
            let registry = StormRegistry::load();
            let storms: Vec<_> = registry
                .landfalls
                .iter()
                .map(|landfall| {
                    let id = landfall.storm_id();
                    let track = match registry.track_source(&id) {
                        TrackSource::Query(storm) => json!({ "query": storm }),
                        TrackSource::LatestFeed(url) => json!({ "latestFeed": url }),
                    };
                    let impact = match registry.impact_source(&id) {
                        ImpactSource::Precomputed(name) => json!({ "precomputed": name }),
                        ImpactSource::TrackBuffers => json!("trackBuffers"),
                    };
                    json!({
                        "storm": id,
                        "title": render_storm_name(&id, false),
                        "coordinates": landfall.coordinates,
                        "track": track,
                        "impact": impact,
                    })
                })
                .collect();
            print_json(&storms)?;
        }
        Commands::Menu { stage, storm } => {
            let ctx = MenuContext {
                storm_name: &storm,
                ..MenuContext::default()
            };
            print_json(&json!({
                "placeholder": placeholder(stage, &storm),
                "options": menu_options(stage, &ctx),
            }))?;
        }
    }

    Ok(())
}
