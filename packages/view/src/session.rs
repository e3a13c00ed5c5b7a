//! Wires the map state to the data services.

use std::cell::{Ref, RefCell};
use std::sync::Arc;

use landmark_map_landmark_models::{FilterField, FilterValue};
use landmark_map_source::{AttributeQueryService, GeometrySource, SourceError};

use crate::detail::{DetailCardBuilder, SubListKind};
use crate::display::CardId;
use crate::filter::{FilterController, FilterOutcome};
use crate::layer::FeatureId;
use crate::policy::{RenderPolicy, StepOutcome};
use crate::state::MapState;

/// Options fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub policy: RenderPolicy,
}

impl SessionOptions {
    /// Reads options from the environment (see
    /// [`RenderPolicy::from_env`]).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            policy: RenderPolicy::from_env(),
        }
    }
}

/// How the startup load went.
#[derive(Debug)]
pub struct LoadReport {
    pub landmarks: StepOutcome,
    pub catalogs: Vec<(FilterField, Result<usize, SourceError>)>,
}

/// One interactive map session.
///
/// All UI state sits behind a single `RefCell`; the session is driven from
/// one task, and its futures are not `Send`.
pub struct MapSession {
    state: RefCell<MapState>,
    geometry: Arc<dyn GeometrySource>,
    filters: FilterController,
    details: DetailCardBuilder,
}

impl MapSession {
    #[must_use]
    pub fn new(
        geometry: Arc<dyn GeometrySource>,
        attributes: Arc<dyn AttributeQueryService>,
        options: SessionOptions,
    ) -> Self {
        log::debug!("Starting map session with {} render policy", options.policy);
        Self {
            state: RefCell::new(MapState::new(options.policy)),
            filters: FilterController::new(geometry.clone(), attributes.clone()),
            details: DetailCardBuilder::new(attributes),
            geometry,
        }
    }

    /// Creates a session backed by one service implementing both traits.
    #[must_use]
    pub fn with_source<S>(source: Arc<S>, options: SessionOptions) -> Self
    where
        S: GeometrySource + AttributeQueryService + 'static,
    {
        Self::new(source.clone(), source, options)
    }

    /// Borrows the current state. Do not hold the borrow across an await.
    #[must_use]
    pub fn state(&self) -> Ref<'_, MapState> {
        self.state.borrow()
    }

    /// Fetches every landmark and both filter catalogs concurrently.
    ///
    /// Landmark geometry is dropped if a filter was activated while it was
    /// in flight (under [`RenderPolicy::DiscardStale`]).
    #[allow(clippy::future_not_send)]
    pub async fn load(&self) -> LoadReport {
        let epoch = self.state.borrow().layer.epoch();
        let landmarks = async {
            let result = self.geometry.fetch_all_landmarks().await;
            self.state.borrow_mut().render_geometry(epoch, result)
        };
        let catalogs = futures::future::join_all(
            FilterField::all()
                .iter()
                .map(|&field| self.filters.load_catalog(&self.state, field)),
        );
        let (landmarks, results) = futures::join!(landmarks, catalogs);

        let catalogs: Vec<_> = FilterField::all().iter().copied().zip(results).collect();
        for (field, result) in &catalogs {
            if let Err(e) = result {
                log::warn!("Failed to load {} filters: {e}", field.label());
            }
        }
        if let StepOutcome::Rendered { items } = landmarks {
            log::info!("Loaded {items} landmarks");
        }

        LoadReport {
            landmarks,
            catalogs,
        }
    }

    /// Selects feature `id` and shows its detail card.
    ///
    /// Returns `None` without touching anything if `id` is not on the layer.
    pub fn click_feature(&self, id: FeatureId) -> Option<CardId> {
        let mut guard = self.state.borrow_mut();
        let map = &mut *guard;
        let Some(landmark) = map.layer.get(id).map(|f| f.landmark().clone()) else {
            log::warn!("Ignoring click on unknown feature {}", id.value());
            return None;
        };
        map.selection
            .select_feature(id, &mut map.layer, &mut map.controls);
        Some(map.display.show_detail(&landmark))
    }

    /// Activates `filter` (see [`FilterController::activate`]).
    #[allow(clippy::future_not_send)]
    pub async fn activate_filter(&self, filter: FilterValue) -> FilterOutcome {
        self.filters.activate(&self.state, filter).await
    }

    /// Loads the `kind` sub-list of the detail card currently shown.
    #[allow(clippy::future_not_send)]
    pub async fn show_sub_list(&self, kind: SubListKind) -> StepOutcome {
        let card = self.state.borrow().display.detail().map(|card| card.id);
        match card {
            Some(card) => self.details.show_sub_list(&self.state, card, kind).await,
            None => {
                log::debug!("No detail card open for {kind}");
                StepOutcome::Discarded
            }
        }
    }

    /// Clears the selection and the display.
    pub fn clear_selection(&self) {
        let mut guard = self.state.borrow_mut();
        let map = &mut *guard;
        map.display.clear();
        map.selection.clear(&mut map.layer, &mut map.controls);
    }

    #[must_use]
    pub fn feature_for_bin(&self, bin: &str) -> Option<FeatureId> {
        self.state.borrow().layer.find_by_bin(bin)
    }

    /// Exports the current layer as `GeoJSON`.
    #[must_use]
    pub fn layer_geojson(&self) -> geojson::FeatureCollection {
        self.state.borrow().layer.to_feature_collection()
    }
}

#[cfg(test)]
mod tests {
    use landmark_map_landmark_models::{
        ComplaintRecord, Landmark, LandmarkFeature, ViolationRecord,
    };

    use super::*;
    use crate::detail::SubListBody;
    use crate::display::Card;
    use crate::selection::Selection;
    use crate::stub::{Call, Held, StubSource, landmark_feature, overview};

    fn neo_roman() -> FilterValue {
        FilterValue::new(FilterField::Style, "Neo-Roman")
    }

    fn soho() -> FilterValue {
        FilterValue::new(FilterField::District, "SoHo-Cast Iron")
    }

    fn stub() -> StubSource {
        StubSource::default()
            .with_landmarks(vec![
                landmark_feature("1", "Neo-Roman"),
                landmark_feature("2", "Neo-Roman"),
                landmark_feature("3", "Neo-Roman"),
                landmark_feature("4", "Italianate"),
            ])
            .with_filter(
                &neo_roman(),
                vec![
                    landmark_feature("1", "Neo-Roman"),
                    landmark_feature("2", "Neo-Roman"),
                    landmark_feature("3", "Neo-Roman"),
                ],
                vec![overview(&[("count_of_styles", "3")])],
            )
            .with_filter(
                &soho(),
                vec![landmark_feature("4", "Italianate")],
                vec![overview(&[("count_of_landmarks", "1")])],
            )
            .with_violations(
                "1",
                vec![ViolationRecord {
                    date: Some("2019-03-14T00:00:00.000".to_string()),
                    class: Some("B".to_string()),
                }],
            )
            .with_complaints("1", Vec::<ComplaintRecord>::new())
    }

    fn session(stub: &Arc<StubSource>, policy: RenderPolicy) -> MapSession {
        MapSession::with_source(stub.clone(), SessionOptions { policy })
    }

    fn layer_bins(session: &MapSession) -> Vec<String> {
        session
            .state()
            .layer()
            .iter()
            .filter_map(|f| f.landmark().bin().map(str::to_string))
            .collect()
    }

    fn current_card(session: &MapSession) -> Option<Card> {
        session.state().display().card().cloned()
    }

    #[tokio::test]
    async fn load_fills_layer_and_controls() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());

        let report = session.load().await;

        assert!(matches!(report.landmarks, StepOutcome::Rendered { items: 4 }));
        assert!(report.catalogs.iter().all(|(_, r)| matches!(r, Ok(1))));
        let state = session.state();
        assert_eq!(state.layer().len(), 4);
        assert_eq!(state.controls().group(FilterField::Style)[0].filter, neo_roman());
        assert_eq!(state.controls().group(FilterField::District)[0].filter, soho());
        assert_eq!(state.emphasized_count(), 0);
    }

    #[tokio::test]
    async fn catalog_failure_keeps_other_group() {
        let stub = Arc::new(stub());
        stub.fail(Call::Catalog(FilterField::Style));
        let session = session(&stub, RenderPolicy::default());

        let report = session.load().await;

        assert!(report.catalogs[0].1.is_err());
        assert!(matches!(report.catalogs[1].1, Ok(1)));
        assert!(session.state().controls().group(FilterField::Style).is_empty());
        assert_eq!(session.state().layer().len(), 4);
    }

    #[tokio::test]
    async fn activating_filter_renders_geometry_and_overview() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;

        let outcome = session.activate_filter(neo_roman()).await;

        assert!(matches!(outcome.geometry, StepOutcome::Rendered { items: 3 }));
        assert!(matches!(outcome.overview, StepOutcome::Rendered { items: 1 }));
        assert_eq!(layer_bins(&session), ["1", "2", "3"]);

        let card = current_card(&session).unwrap();
        let overview = card.as_overview().unwrap();
        assert_eq!(overview.title, "Neo-Roman");
        assert_eq!(overview.lines, ["count_of_styles - 3"]);

        let state = session.state();
        assert_eq!(state.selection().current(), &Selection::Filter(neo_roman()));
        let control = state.controls().find(&neo_roman()).unwrap();
        assert_eq!(control.emphasis().unwrap().background, "lightblue");
        assert!(stub.calls().contains(&Call::Landmarks(neo_roman())));
        assert!(stub.calls().contains(&Call::Overview(neo_roman())));
    }

    #[tokio::test]
    async fn at_most_one_selection_is_emphasized() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;

        let check = |session: &MapSession| {
            let state = session.state();
            assert!(state.emphasized_count() <= 1);
            assert!(state.display().card_count() <= 1);
        };

        let first = session.feature_for_bin("1").unwrap();
        session.click_feature(first).unwrap();
        check(&session);
        let second = session.feature_for_bin("2").unwrap();
        session.click_feature(second).unwrap();
        check(&session);
        assert!(!session.state().layer().get(first).unwrap().is_emphasized());

        session.activate_filter(neo_roman()).await;
        check(&session);
        session.activate_filter(soho()).await;
        check(&session);
        assert!(
            session
                .state()
                .controls()
                .find(&neo_roman())
                .unwrap()
                .emphasis()
                .is_none()
        );

        let landmark = session.feature_for_bin("4").unwrap();
        session.click_feature(landmark).unwrap();
        check(&session);
        assert_eq!(session.state().controls().emphasized_count(), 0);
        assert_eq!(session.state().layer().emphasized_count(), 1);

        session.clear_selection();
        assert_eq!(session.state().emphasized_count(), 0);
        assert!(current_card(&session).is_none());
    }

    #[tokio::test]
    async fn clicking_a_feature_shows_its_detail_card() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;

        let id = session.feature_for_bin("2").unwrap();
        let card_id = session.click_feature(id).unwrap();

        let card = current_card(&session).unwrap();
        assert_eq!(card.id(), card_id);
        let detail = card.as_detail().unwrap();
        assert_eq!(detail.header, "2 Broadway, Manhattan, NYC 10012");
        assert!(!detail.details.iter().any(|l| l.starts_with("Historic District")));
    }

    #[tokio::test]
    async fn click_on_stale_feature_is_ignored() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;
        let stale = session.feature_for_bin("4").unwrap();

        session.activate_filter(neo_roman()).await;

        assert!(session.click_feature(stale).is_none());
        assert!(current_card(&session).unwrap().as_overview().is_some());
        assert_eq!(session.state().selection().selected_filter(), Some(&neo_roman()));
    }

    #[allow(clippy::future_not_send)]
    async fn click_while_overview_in_flight(policy: RenderPolicy) -> (StepOutcome, Card, usize) {
        let stub = Arc::new(stub());
        let Held { arrived, release } = stub.hold(Call::Overview(neo_roman()));
        let session = session(&stub, policy);
        let session_ref = &session;

        let click = async move {
            arrived.await.unwrap();
            let id = session_ref.feature_for_bin("1").unwrap();
            session_ref.click_feature(id).unwrap();
            release.send(()).unwrap();
        };
        let (outcome, ()) = futures::join!(session.activate_filter(neo_roman()), click);

        let card = current_card(&session).unwrap();
        let emphasized = session.state().emphasized_count();
        (outcome.overview, card, emphasized)
    }

    #[tokio::test]
    async fn stale_overview_is_discarded_after_feature_click() {
        let (overview, card, emphasized) =
            click_while_overview_in_flight(RenderPolicy::DiscardStale).await;

        assert!(overview.is_discarded());
        assert!(card.as_detail().is_some());
        assert_eq!(emphasized, 1);
    }

    #[tokio::test]
    async fn late_overview_overwrites_detail_under_last_write_wins() {
        let (overview, card, emphasized) =
            click_while_overview_in_flight(RenderPolicy::LastWriteWins).await;

        assert!(overview.is_rendered());
        assert_eq!(card.as_overview().unwrap().title, "Neo-Roman");
        assert_eq!(emphasized, 1);
    }

    #[allow(clippy::future_not_send)]
    async fn switch_filter_while_geometry_in_flight(
        policy: RenderPolicy,
    ) -> (FilterOutcome, FilterOutcome, Vec<String>, Card) {
        let stub = Arc::new(stub());
        let Held { arrived, release } = stub.hold(Call::Landmarks(neo_roman()));
        let session = session(&stub, policy);
        let session_ref = &session;

        let switch = async move {
            arrived.await.unwrap();
            let outcome = session_ref.activate_filter(soho()).await;
            release.send(()).unwrap();
            outcome
        };
        let (first, second) = futures::join!(session.activate_filter(neo_roman()), switch);

        let bins = layer_bins(&session);
        let card = current_card(&session).unwrap();
        (first, second, bins, card)
    }

    #[tokio::test]
    async fn stale_geometry_is_not_drawn_on_new_layer() {
        let (first, second, bins, card) =
            switch_filter_while_geometry_in_flight(RenderPolicy::DiscardStale).await;

        assert!(first.geometry.is_discarded());
        assert!(second.geometry.is_rendered());
        assert_eq!(bins, ["4"]);
        assert_eq!(card.as_overview().unwrap().title, "SoHo-Cast Iron");
    }

    #[tokio::test]
    async fn stale_geometry_is_appended_under_last_write_wins() {
        let (first, _, bins, card) =
            switch_filter_while_geometry_in_flight(RenderPolicy::LastWriteWins).await;

        assert!(first.geometry.is_rendered());
        assert_eq!(bins, ["4", "1", "2", "3"]);
        assert_eq!(card.as_overview().unwrap().title, "SoHo-Cast Iron");
    }

    #[tokio::test]
    async fn initial_load_is_dropped_when_filter_activates_first() {
        let stub = Arc::new(stub());
        let Held { arrived, release } = stub.hold(Call::AllLandmarks);
        let session = session(&stub, RenderPolicy::DiscardStale);
        let session_ref = &session;

        let activate = async move {
            arrived.await.unwrap();
            session_ref.activate_filter(neo_roman()).await;
            release.send(()).unwrap();
        };
        let (report, ()) = futures::join!(session.load(), activate);

        assert!(report.landmarks.is_discarded());
        assert_eq!(layer_bins(&session), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn overview_failure_leaves_geometry() {
        let stub = Arc::new(stub());
        stub.fail(Call::Overview(neo_roman()));
        let session = session(&stub, RenderPolicy::default());
        session.load().await;

        let outcome = session.activate_filter(neo_roman()).await;

        assert!(matches!(
            outcome.overview,
            StepOutcome::Failed(SourceError::Status { status: 503, .. })
        ));
        assert!(outcome.geometry.is_rendered());
        assert!(current_card(&session).is_none());
        assert_eq!(session.state().layer().len(), 3);
    }

    #[tokio::test]
    async fn geometry_failure_leaves_overview() {
        let stub = Arc::new(stub());
        stub.fail(Call::Landmarks(neo_roman()));
        let session = session(&stub, RenderPolicy::default());
        session.load().await;

        let outcome = session.activate_filter(neo_roman()).await;

        assert!(outcome.geometry.is_failed());
        assert!(outcome.overview.is_rendered());
        assert!(session.state().layer().is_empty());
        assert!(current_card(&session).unwrap().as_overview().is_some());
    }

    #[tokio::test]
    async fn empty_overview_renders_placeholder() {
        let stub = Arc::new(stub().with_filter(
            &FilterValue::new(FilterField::Style, "Brutalist"),
            Vec::new(),
            Vec::new(),
        ));
        let session = session(&stub, RenderPolicy::default());

        let outcome = session
            .activate_filter(FilterValue::new(FilterField::Style, "Brutalist"))
            .await;

        assert!(matches!(outcome.overview, StepOutcome::Rendered { items: 0 }));
        let card = current_card(&session).unwrap();
        assert_eq!(
            card.as_overview().unwrap().placeholder,
            Some(crate::display::EMPTY_OVERVIEW)
        );
    }

    #[tokio::test]
    async fn sub_lists_render_items_or_placeholder() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;
        session.click_feature(session.feature_for_bin("1").unwrap());

        let violations = session.show_sub_list(SubListKind::Violations).await;
        let complaints = session.show_sub_list(SubListKind::Complaints).await;

        assert!(matches!(violations, StepOutcome::Rendered { items: 1 }));
        assert!(matches!(complaints, StepOutcome::Rendered { items: 0 }));
        let card = current_card(&session).unwrap();
        let detail = card.as_detail().unwrap();
        match &detail.sub_list(SubListKind::Violations).unwrap().body {
            SubListBody::Items(items) => assert_eq!(
                items[0].lines,
                ["Violation Date: 2019-03-14", "Violation Class: B"]
            ),
            SubListBody::Placeholder(text) => panic!("unexpected placeholder {text}"),
        }
        assert_eq!(
            detail.sub_list(SubListKind::Complaints).unwrap().body,
            SubListBody::Placeholder("No complaints in dataset")
        );
    }

    #[tokio::test]
    async fn retriggering_sub_list_keeps_one_list() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;
        session.click_feature(session.feature_for_bin("1").unwrap());

        session.show_sub_list(SubListKind::Violations).await;
        session.show_sub_list(SubListKind::Violations).await;

        let card = current_card(&session).unwrap();
        assert_eq!(
            card.as_detail()
                .unwrap()
                .sub_list(SubListKind::Violations)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            stub.calls()
                .iter()
                .filter(|c| **c == Call::Violations("1".to_string()))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn superseded_sub_list_fetch_is_discarded() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::DiscardStale);
        session.load().await;
        session.click_feature(session.feature_for_bin("1").unwrap());
        let Held { arrived, release } = stub.hold(Call::Violations("1".to_string()));
        let session_ref = &session;

        let retrigger = async move {
            arrived.await.unwrap();
            let outcome = session_ref.show_sub_list(SubListKind::Violations).await;
            release.send(()).unwrap();
            outcome
        };
        let (first, second) = futures::join!(
            session.show_sub_list(SubListKind::Violations),
            retrigger
        );

        assert!(first.is_discarded());
        assert!(second.is_rendered());
    }

    #[tokio::test]
    async fn sub_list_for_closed_card_is_discarded() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::LastWriteWins);
        session.load().await;
        session.click_feature(session.feature_for_bin("1").unwrap());
        let Held { arrived, release } = stub.hold(Call::Violations("1".to_string()));
        let session_ref = &session;

        let reselect = async move {
            arrived.await.unwrap();
            session_ref.click_feature(session_ref.feature_for_bin("2").unwrap());
            release.send(()).unwrap();
        };
        let (outcome, ()) = futures::join!(
            session.show_sub_list(SubListKind::Violations),
            reselect
        );

        assert!(outcome.is_discarded());
        let card = current_card(&session).unwrap();
        let detail = card.as_detail().unwrap();
        assert_eq!(detail.bin.as_deref(), Some("2"));
        assert!(detail.sub_list(SubListKind::Violations).is_none());
    }

    #[tokio::test]
    async fn failed_sub_list_fetch_keeps_previous_list() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());
        session.load().await;
        session.click_feature(session.feature_for_bin("1").unwrap());

        let first = session.show_sub_list(SubListKind::Violations).await;
        stub.fail(Call::Violations("1".to_string()));
        let second = session.show_sub_list(SubListKind::Violations).await;

        assert!(first.is_rendered());
        assert!(matches!(
            second,
            StepOutcome::Failed(SourceError::Status { status: 503, .. })
        ));
        let card = current_card(&session).unwrap();
        let violations = card
            .as_detail()
            .unwrap()
            .sub_list(SubListKind::Violations)
            .unwrap();
        assert_eq!(violations.len(), 1);
    }

    #[tokio::test]
    async fn sub_list_for_landmark_without_bin_is_malformed() {
        let stub = Arc::new(StubSource::default().with_landmarks(vec![LandmarkFeature {
            geometry: None,
            landmark: Landmark {
                address: Some("1 Bowling Green".to_string()),
                ..Landmark::default()
            },
        }]));
        let session = session(&stub, RenderPolicy::default());
        session.load().await;
        let id = session.state().layer().iter().next().unwrap().id();
        session.click_feature(id).unwrap();

        let outcome = session.show_sub_list(SubListKind::Violations).await;

        match outcome {
            StepOutcome::Failed(e) => assert!(e.is_malformed()),
            other => panic!("expected a malformed result, got {other:?}"),
        }
        assert!(
            !stub
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Violations(_)))
        );
        let card = current_card(&session).unwrap();
        assert!(card.as_detail().unwrap().sub_list(SubListKind::Violations).is_none());
    }

    #[tokio::test]
    async fn sub_list_without_detail_card_is_ignored() {
        let stub = Arc::new(stub());
        let session = session(&stub, RenderPolicy::default());

        let outcome = session.show_sub_list(SubListKind::Complaints).await;

        assert!(outcome.is_discarded());
        assert!(stub.calls().is_empty());
    }
}
