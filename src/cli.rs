use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::telemetry;
use crate::workflows::opportunity::assessment::{
    requires_override_confirmation, Dimension, FitScores, RecommendationResponse, StageAssessment,
};
use crate::workflows::opportunity::solution_map::MapSummary;
use crate::workflows::opportunity::{
    AssessmentEngine, Deal, DealId, DealProfile, DealRepository, DealService,
    JsonFileDealRepository, MapOutcome, ScoreConfig, Solution, SolutionMapStore, StageId,
};

#[derive(Parser, Debug)]
#[command(
    name = "dealfit",
    about = "Track deal qualification scores and customer solution maps from the command line",
    version
)]
pub struct Cli {
    /// Override the configured deal store (JSON file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage deals
    Deal {
        #[command(subcommand)]
        command: DealCommand,
    },
    /// Edit a deal's solution map and its saved snapshots
    Map {
        #[command(subcommand)]
        command: MapCommand,
    },
    /// Score a deal's biz/tech fit per stage
    Assess {
        #[command(subcommand)]
        command: AssessCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum DealCommand {
    /// Register a new deal
    Create(ProfileArgs),
    /// List deals, most recently updated first
    List,
    /// Show a deal header and stage progress
    Show { deal: String },
    /// Replace a deal's header fields
    Update {
        deal: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Delete a deal and everything it owns
    Delete { deal: String },
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[arg(long)]
    client: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    client_contact: String,
    #[arg(long, default_value = "")]
    internal_contact: String,
    #[arg(long, default_value = "")]
    solution: String,
    /// Expected purchase date (free text, usually YYYY-MM-DD)
    #[arg(long, default_value = "")]
    purchase_date: String,
    #[arg(long, default_value = "")]
    memo: String,
}

impl From<ProfileArgs> for DealProfile {
    fn from(args: ProfileArgs) -> Self {
        DealProfile {
            client_name: args.client,
            deal_name: args.name,
            client_contact: args.client_contact,
            internal_contact: args.internal_contact,
            solution: args.solution,
            purchase_date: args.purchase_date,
            memo: args.memo,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum MapCommand {
    /// Print the working draft with share allocation per category
    Show { deal: String },
    AddDomain { deal: String, name: String },
    RenameDomain { deal: String, old: String, new: String },
    DeleteDomain { deal: String, name: String },
    AddCategory { deal: String, domain: String, name: String },
    RenameCategory {
        deal: String,
        domain: String,
        old: String,
        new: String,
    },
    DeleteCategory { deal: String, domain: String, name: String },
    AddSolution {
        deal: String,
        domain: String,
        category: String,
        #[command(flatten)]
        solution: SolutionArgs,
    },
    UpdateSolution {
        deal: String,
        domain: String,
        category: String,
        index: usize,
        #[command(flatten)]
        solution: SolutionArgs,
    },
    DeleteSolution {
        deal: String,
        domain: String,
        category: String,
        index: usize,
    },
    /// Start a fresh, empty working draft
    Reset { deal: String },
    /// Save the working draft as a named snapshot
    Snapshot {
        deal: String,
        /// Defaults to "<first domain>_<YYYY.MM.DD>"
        #[arg(long, default_value = "")]
        title: String,
    },
    /// List saved snapshots
    Snapshots { deal: String },
    /// Replace the working draft with a copy of a snapshot
    LoadSnapshot { deal: String, id: String },
    DeleteSnapshot { deal: String, id: String },
}

#[derive(Args, Debug)]
pub struct SolutionArgs {
    name: String,
    /// Percentage of the category this solution covers
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    share: u32,
    #[arg(long, default_value = "")]
    manufacturer: String,
    /// Repeat for several pain points
    #[arg(long = "pain-point")]
    pain_points: Vec<String>,
    #[arg(long, default_value = "")]
    note: String,
}

impl From<SolutionArgs> for Solution {
    fn from(args: SolutionArgs) -> Self {
        Solution {
            name: args.name,
            share: args.share,
            manufacturer: args.manufacturer,
            pain_points: args.pain_points,
            note: args.note,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AssessCommand {
    /// Print a stage's scores and suggestions
    Show {
        deal: String,
        #[arg(value_parser = parse_stage)]
        stage: StageId,
    },
    /// Record a 1-5 item score
    Score {
        deal: String,
        #[arg(value_parser = parse_stage)]
        stage: StageId,
        #[arg(value_parser = parse_dimension)]
        dimension: Dimension,
        category: String,
        item: usize,
        #[arg(value_parser = clap::value_parser!(i32).range(1..=5))]
        value: i32,
        /// Accept a score that diverges from the suggestion by two or more
        #[arg(long)]
        confirm: bool,
    },
    /// Set a category weight (clamped to 0-100)
    Weight {
        deal: String,
        #[arg(value_parser = parse_stage)]
        stage: StageId,
        #[arg(value_parser = parse_dimension)]
        dimension: Dimension,
        category: String,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
    /// Compute fit scores and the quadrant
    Result {
        deal: String,
        #[arg(value_parser = parse_stage)]
        stage: StageId,
    },
    /// Attach scoring suggestions from a JSON document
    Recommend {
        deal: String,
        #[arg(value_parser = parse_stage)]
        stage: StageId,
        #[arg(long)]
        file: PathBuf,
    },
}

fn parse_stage(raw: &str) -> Result<StageId, String> {
    raw.parse()
}

fn parse_dimension(raw: &str) -> Result<Dimension, String> {
    raw.parse()
}

/// Services sharing one repository for the duration of a command.
pub struct Session<R> {
    pub deals: DealService<R>,
    pub maps: SolutionMapStore<R>,
    pub assessments: AssessmentEngine<R>,
}

impl<R> Session<R>
where
    R: DealRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            deals: DealService::new(repository.clone()),
            maps: SolutionMapStore::new(repository.clone()),
            assessments: AssessmentEngine::new(repository),
        }
    }
}

pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(path) = cli.data {
        config.storage.data_path = path;
    }

    telemetry::init(config.environment, &config.telemetry)?;
    info!(
        environment = ?config.environment,
        path = %config.storage.data_path.display(),
        "deal store opened"
    );

    let repository = Arc::new(JsonFileDealRepository::new(config.storage.data_path.clone()));
    let session = Session::new(repository);
    execute(&session, cli.command)
}

pub fn execute<R>(session: &Session<R>, command: Command) -> Result<(), AppError>
where
    R: DealRepository + 'static,
{
    match command {
        Command::Deal { command } => execute_deal(session, command),
        Command::Map { command } => execute_map(session, command),
        Command::Assess { command } => execute_assess(session, command),
    }
}

fn execute_deal<R>(session: &Session<R>, command: DealCommand) -> Result<(), AppError>
where
    R: DealRepository + 'static,
{
    match command {
        DealCommand::Create(profile) => {
            let deal = session.deals.create(profile.into())?;
            println!("Created deal {} ({} / {})", deal.id, deal.client_name, deal.deal_name);
        }
        DealCommand::List => {
            let deals = session.deals.list()?;
            if deals.is_empty() {
                println!("No deals yet");
            }
            for deal in deals {
                println!(
                    "- {} | {} | {} | updated {}",
                    deal.id,
                    deal.client_name,
                    deal.deal_name,
                    deal.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        DealCommand::Show { deal } => {
            let deal_id = DealId::new(deal);
            let deal = session.deals.get(&deal_id)?;
            render_deal(&deal);
            println!("\nQualification progress");
            for summary in session.assessments.stage_overview(&deal_id)? {
                match summary.scores {
                    Some(scores) => println!(
                        "- {}: Biz {} / Tech {} ({})",
                        summary.stage.label(),
                        scores.biz_score,
                        scores.tech_score,
                        scores.quadrant().label()
                    ),
                    None if summary.completed => {
                        println!("- {}: completed, weights need attention", summary.stage.label())
                    }
                    None => println!("- {}: not assessed", summary.stage.label()),
                }
            }
        }
        DealCommand::Update { deal, profile } => {
            let deal = session
                .deals
                .update_profile(&DealId::new(deal), profile.into())?;
            println!("Updated deal {}", deal.id);
        }
        DealCommand::Delete { deal } => {
            session.deals.delete(&DealId::new(deal.clone()))?;
            println!("Deleted deal {deal}");
        }
    }
    Ok(())
}

fn execute_map<R>(session: &Session<R>, command: MapCommand) -> Result<(), AppError>
where
    R: DealRepository + 'static,
{
    let maps = &session.maps;
    let outcome = match command {
        MapCommand::Show { deal } => {
            let summary = maps.summary(&DealId::new(deal))?;
            render_map(&summary);
            return Ok(());
        }
        MapCommand::AddDomain { deal, name } => maps.add_domain(&DealId::new(deal), &name)?,
        MapCommand::RenameDomain { deal, old, new } => {
            maps.rename_domain(&DealId::new(deal), &old, &new)?
        }
        MapCommand::DeleteDomain { deal, name } => maps.delete_domain(&DealId::new(deal), &name)?,
        MapCommand::AddCategory { deal, domain, name } => {
            maps.add_category(&DealId::new(deal), &domain, &name)?
        }
        MapCommand::RenameCategory {
            deal,
            domain,
            old,
            new,
        } => maps.rename_category(&DealId::new(deal), &domain, &old, &new)?,
        MapCommand::DeleteCategory { deal, domain, name } => {
            maps.delete_category(&DealId::new(deal), &domain, &name)?
        }
        MapCommand::AddSolution {
            deal,
            domain,
            category,
            solution,
        } => maps.add_solution(&DealId::new(deal), &domain, &category, solution.into())?,
        MapCommand::UpdateSolution {
            deal,
            domain,
            category,
            index,
            solution,
        } => maps.update_solution(
            &DealId::new(deal),
            &domain,
            &category,
            index,
            solution.into(),
        )?,
        MapCommand::DeleteSolution {
            deal,
            domain,
            category,
            index,
        } => maps.delete_solution(&DealId::new(deal), &domain, &category, index)?,
        MapCommand::Reset { deal } => maps.reset(&DealId::new(deal))?,
        MapCommand::Snapshot { deal, title } => {
            let saved = maps.snapshot(&DealId::new(deal), &title)?;
            println!("Saved snapshot {} \"{}\"", saved.id, saved.title);
            return Ok(());
        }
        MapCommand::Snapshots { deal } => {
            let snapshots = maps.snapshots(&DealId::new(deal))?;
            if snapshots.is_empty() {
                println!("No saved maps");
            }
            for saved in snapshots {
                println!(
                    "- {} | {} | {} domain(s) | updated {}",
                    saved.id,
                    saved.title,
                    saved.content.len(),
                    saved.updated_at.format("%Y-%m-%d")
                );
            }
            return Ok(());
        }
        MapCommand::LoadSnapshot { deal, id } => maps.load_snapshot(&DealId::new(deal), &id)?,
        MapCommand::DeleteSnapshot { deal, id } => {
            maps.delete_snapshot(&DealId::new(deal), &id)?
        }
    };

    report_outcome(outcome);
    Ok(())
}

fn execute_assess<R>(session: &Session<R>, command: AssessCommand) -> Result<(), AppError>
where
    R: DealRepository + 'static,
{
    let engine = &session.assessments;
    match command {
        AssessCommand::Show { deal, stage } => {
            let view = engine.record(&DealId::new(deal), stage)?;
            render_assessment(engine.config(), &view);
        }
        AssessCommand::Score {
            deal,
            stage,
            dimension,
            category,
            item,
            value,
            confirm,
        } => {
            let deal_id = DealId::new(deal);
            let view = engine.record(&deal_id, stage)?;
            if let Some(suggestion) = view.record.recommendation(dimension, &category, item) {
                if requires_override_confirmation(value, suggestion.score) && !confirm {
                    return Err(AppError::Input(format!(
                        "suggested score is {}, {} differs by two or more; rerun with --confirm to keep it",
                        suggestion.score, value
                    )));
                }
            }
            engine.set_item_score(&deal_id, stage, dimension, &category, item, value)?;
            println!("Saved {dimension} {category}_{item} = {value}");
        }
        AssessCommand::Weight {
            deal,
            stage,
            dimension,
            category,
            value,
        } => {
            let value = value.clamp(0, 100);
            let sum = engine.set_category_weight(
                &DealId::new(deal),
                stage,
                dimension,
                &category,
                value,
            )?;
            let note = if sum == 100 { "" } else { " (must total 100)" };
            println!("Saved {dimension} {category} weight = {value}; total {sum}%{note}");
        }
        AssessCommand::Result { deal, stage } => {
            let scores = engine.compute_scores(&DealId::new(deal), stage)?;
            render_scores(&scores);
        }
        AssessCommand::Recommend { deal, stage, file } => {
            let raw = std::fs::read_to_string(&file)?;
            let response = RecommendationResponse::parse(&raw)?;
            engine.attach_response(&DealId::new(deal), stage, response)?;
            println!("Suggestions attached to {}", stage.effective().label());
        }
    }
    Ok(())
}

fn report_outcome(outcome: MapOutcome) {
    match outcome {
        MapOutcome::Applied => println!("{}", outcome.code()),
        MapOutcome::Unchanged => println!("{} (no change)", outcome.code()),
    }
}

fn render_deal(deal: &Deal) {
    println!("{} / {}", deal.client_name, deal.deal_name);
    println!("Id: {}", deal.id);
    if !deal.solution.is_empty() {
        println!("Solution: {}", deal.solution);
    }
    if !deal.purchase_date.is_empty() {
        println!("Expected purchase: {}", deal.purchase_date);
    }
    if !deal.client_contact.is_empty() || !deal.internal_contact.is_empty() {
        println!(
            "Contacts: client {}, internal {}",
            deal.client_contact, deal.internal_contact
        );
    }
    if !deal.memo.is_empty() {
        println!("Memo: {}", deal.memo);
    }
    println!(
        "Solution map: {} domain(s), {} saved map(s), {} report(s)",
        deal.solution_map_content.len(),
        deal.saved_maps.len(),
        deal.reports.len()
    );
}

fn render_map(summary: &MapSummary) {
    if summary.domains.is_empty() {
        println!("Working draft is empty");
        return;
    }
    for domain in &summary.domains {
        println!("{}", domain.name);
        if domain.categories.is_empty() {
            println!("  (no categories)");
        }
        for category in &domain.categories {
            println!(
                "  - {}: {} solution(s), {}% allocated, {}% free",
                category.name,
                category.solution_count,
                category.allocated_share,
                category.remaining_share
            );
        }
    }
}

fn render_assessment(config: &ScoreConfig, view: &StageAssessment) {
    let suffix = if view.read_only { " (read-only)" } else { "" };
    println!("{}{}", view.requested.label(), suffix);
    if view.requested != view.source {
        println!("Showing {} record", view.source.label());
    }

    for dimension in Dimension::ordered() {
        let sum = view.record.weight_sum(config, dimension);
        println!("\n{} (weights {}%)", dimension.label(), sum);
        let assessment = view.record.dimension(dimension);
        for category in config.categories(dimension) {
            println!(
                "  {} [{}] weight {}",
                category.label,
                category.id,
                assessment.weight(category)
            );
            for (index, item) in category.items.iter().enumerate() {
                let score = view
                    .record
                    .item_score(dimension, category.id, index)
                    .map(|score| score.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let suggestion = view
                    .record
                    .recommendation(dimension, category.id, index)
                    .map(|rec| format!(" (suggested {} · {})", rec.score, rec.confidence.label()))
                    .unwrap_or_default();
                println!("    {index}. {item}: {score}{suggestion}");
            }
        }
    }

    if view.record.is_completed {
        println!("\nResult has been computed for this stage");
    }
}

fn render_scores(scores: &FitScores) {
    println!(
        "Biz {} / Tech {} -> {}",
        scores.biz_score,
        scores.tech_score,
        scores.quadrant().label()
    );
    for dimension in Dimension::ordered() {
        println!("\n{} (total {})", dimension.label(), scores.score(dimension));
        for category in scores.category_scores.for_dimension(dimension) {
            println!(
                "  - {}: {:.1} / 5.0 (weight {}%)",
                category.label, category.average, category.weight
            );
        }
    }
}
