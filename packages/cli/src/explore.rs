//! The interactive explore loop.
//!
//! Each menu action maps onto one map interaction: activating a filter
//! control, clicking a landmark, or pressing a sub-list trigger on the open
//! detail card. The resulting card is printed after every action.

use dialoguer::{Confirm, Input, Select};
use landmark_map_landmark_models::FilterField;
use landmark_map_view::{FeatureId, MapSession, StepOutcome, SubListKind};

/// Number of landmarks listed per page in the picker.
const PAGE_SIZE: usize = 20;

/// Top-level explorer actions.
enum Action {
    FilterByStyle,
    FilterByDistrict,
    SelectLandmark,
    FindByBin,
    SeeViolations,
    SeeComplaints,
    ClearSelection,
    CardJson,
    ExportLayer,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::FilterByStyle,
        Self::FilterByDistrict,
        Self::SelectLandmark,
        Self::FindByBin,
        Self::SeeViolations,
        Self::SeeComplaints,
        Self::ClearSelection,
        Self::CardJson,
        Self::ExportLayer,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::FilterByStyle => "Filter by primary style",
            Self::FilterByDistrict => "Filter by historic district",
            Self::SelectLandmark => "Select a landmark on the map",
            Self::FindByBin => "Select a landmark by BIN",
            Self::SeeViolations => "See violations",
            Self::SeeComplaints => "See complaints",
            Self::ClearSelection => "Clear selection",
            Self::CardJson => "Print current card as JSON",
            Self::ExportLayer => "Export map layer (GeoJSON)",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the explorer until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or output cannot be serialized.
#[allow(clippy::future_not_send)]
pub async fn run(session: &MapSession) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("Landmark map")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::FilterByStyle => handle_filter(session, FilterField::Style).await?,
            Action::FilterByDistrict => handle_filter(session, FilterField::District).await?,
            Action::SelectLandmark => {
                if let Some(id) = pick_landmark(session)? {
                    select(session, id);
                }
            }
            Action::FindByBin => handle_find_by_bin(session)?,
            Action::SeeViolations => handle_sub_list(session, SubListKind::Violations).await,
            Action::SeeComplaints => handle_sub_list(session, SubListKind::Complaints).await,
            Action::ClearSelection => {
                session.clear_selection();
                println!("Selection cleared.");
            }
            Action::CardJson => match session.state().display().card() {
                Some(card) => println!("{}", serde_json::to_string_pretty(card)?),
                None => println!("No card is shown."),
            },
            Action::ExportLayer => handle_export(session)?,
            Action::Quit => return Ok(()),
        }
        println!();
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[allow(clippy::future_not_send)]
async fn handle_filter(
    session: &MapSession,
    field: FilterField,
) -> Result<(), Box<dyn std::error::Error>> {
    let filters: Vec<_> = session
        .state()
        .controls()
        .group(field)
        .iter()
        .map(|control| control.filter.clone())
        .collect();

    if filters.is_empty() {
        println!("No {} loaded.", field.label().to_lowercase());
        return Ok(());
    }

    let labels: Vec<&str> = filters.iter().map(|f| f.value.as_str()).collect();
    let idx = Select::new()
        .with_prompt(field.label())
        .items(&labels)
        .default(0)
        .max_length(PAGE_SIZE)
        .interact()?;

    let outcome = session.activate_filter(filters[idx].clone()).await;
    match outcome.geometry {
        StepOutcome::Rendered { items } => println!("{items} landmarks on the map"),
        StepOutcome::Discarded => {}
        StepOutcome::Failed(e) => println!("Could not load landmarks: {e}"),
    }
    if let StepOutcome::Failed(e) = outcome.overview {
        println!("Could not load overview: {e}");
    }
    print_card(session);
    Ok(())
}

fn handle_find_by_bin(session: &MapSession) -> Result<(), Box<dyn std::error::Error>> {
    let bin: String = Input::new()
        .with_prompt("Building identification number (BIN)")
        .interact_text()?;

    match session.feature_for_bin(bin.trim()) {
        Some(id) => select(session, id),
        None => println!("BIN {bin} is not on the map."),
    }
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn handle_sub_list(session: &MapSession, kind: SubListKind) {
    match session.show_sub_list(kind).await {
        StepOutcome::Rendered { .. } => print_card(session),
        StepOutcome::Discarded => println!("Select a landmark first."),
        StepOutcome::Failed(e) => println!("Could not load {kind}: {e}"),
    }
}

fn handle_export(session: &MapSession) -> Result<(), Box<dyn std::error::Error>> {
    let collection = session.layer_geojson();
    let count = collection.features.len();

    let confirmed = Confirm::new()
        .with_prompt(format!("Print {count} features as GeoJSON?"))
        .default(count <= PAGE_SIZE * 10)
        .interact()?;

    if confirmed {
        println!("{}", serde_json::to_string_pretty(&collection)?);
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

fn select(session: &MapSession, id: FeatureId) {
    if session.click_feature(id).is_some() {
        print_card(session);
    } else {
        println!("That landmark is no longer on the map.");
    }
}

fn print_card(session: &MapSession) {
    if let Some(card) = session.state().display().card() {
        println!();
        print!("{card}");
    }
}

// ---------------------------------------------------------------------------
// Paginated landmark picker
// ---------------------------------------------------------------------------

/// Navigation entries appended to a picker page.
enum PickerItem {
    Landmark(FeatureId),
    PreviousPage,
    NextPage,
}

/// Presents the landmarks on the layer one page at a time.
///
/// Returns `None` if the layer is empty.
fn pick_landmark(session: &MapSession) -> Result<Option<FeatureId>, Box<dyn std::error::Error>> {
    let entries: Vec<(FeatureId, String)> = session
        .state()
        .layer()
        .iter()
        .map(|f| (f.id(), f.landmark().header()))
        .collect();

    if entries.is_empty() {
        println!("No landmarks on the map.");
        return Ok(None);
    }

    let total_pages = entries.len().div_ceil(PAGE_SIZE);
    let mut page = 0;

    loop {
        let (labels, items) = build_picker_page(&entries, page, total_pages);

        let idx = Select::new()
            .with_prompt(format!("Select a landmark (page {}/{total_pages})", page + 1))
            .items(&labels)
            .default(usize::from(page > 0))
            .interact()?;

        match items[idx] {
            PickerItem::Landmark(id) => return Ok(Some(id)),
            PickerItem::PreviousPage => page = page.saturating_sub(1),
            PickerItem::NextPage => page += 1,
        }
    }
}

fn build_picker_page(
    entries: &[(FeatureId, String)],
    page: usize,
    total_pages: usize,
) -> (Vec<String>, Vec<PickerItem>) {
    let mut labels = Vec::new();
    let mut items = Vec::new();

    if page > 0 {
        labels.push(format!("\u{2190} Previous page ({} landmarks)", entries.len()));
        items.push(PickerItem::PreviousPage);
    }

    for (id, header) in entries.iter().skip(page * PAGE_SIZE).take(PAGE_SIZE) {
        labels.push(header.clone());
        items.push(PickerItem::Landmark(*id));
    }

    if page + 1 < total_pages {
        labels.push(format!("Next page \u{2192} ({} landmarks)", entries.len()));
        items.push(PickerItem::NextPage);
    }

    (labels, items)
}
