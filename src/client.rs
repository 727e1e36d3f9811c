use std::time::Duration;

use color_eyre::eyre::Result;
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    error,
    warn,
};

use crate::{
    api_client::{
        ApiClient,
        BackendApi,
    },
    platform::{
        Navigator,
        Notifier,
        PlatformEvent,
        Reloader,
        UiPlatform,
    },
    profile::{
        Bet,
        BetCategory,
        UserProfile,
    },
    ui,
};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

// How long the success toast stays readable before the view is torn down.
const RELOAD_NOTICE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base_url: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconciliationState {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub enum ReconciliationEvent {
    Succeeded { message: String },
    Failed { message: String },
    ReloadDue,
}

/// Drives the "Failed Tasks" action: a single-flight backend check whose
/// settlement and reload deadline come back over the event channel returned
/// by [`TaskReconciliationController::new`].
pub struct TaskReconciliationController<Backend, Notify, Reload> {
    backend: Backend,
    notifier: Notify,
    reloader: Reload,
    state: ReconciliationState,
    event_tx: mpsc::UnboundedSender<ReconciliationEvent>,
}

impl<Backend, Notify, Reload> TaskReconciliationController<Backend, Notify, Reload> {
    pub fn new(
        backend: Backend,
        notifier: Notify,
        reloader: Reload,
    ) -> (Self, mpsc::UnboundedReceiver<ReconciliationEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            notifier,
            reloader,
            state: ReconciliationState::Idle,
            event_tx,
        };
        (controller, event_rx)
    }

    pub fn state(&self) -> ReconciliationState {
        self.state
    }
}

impl<Backend, Notify, Reload> TaskReconciliationController<Backend, Notify, Reload>
where
    Backend: BackendApi + Clone + Send + 'static,
    Notify: Notifier,
    Reload: Reloader,
{
    pub fn trigger(&mut self) {
        if matches!(
            self.state,
            ReconciliationState::InFlight | ReconciliationState::Succeeded
        ) {
            // single-flight while a check is out, and once one has succeeded
            // the control stays dead until the reload tears the view down
            return;
        }
        self.state = ReconciliationState::InFlight;
        let backend = self.backend.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match backend.check_tasks().await {
                Ok(message) => ReconciliationEvent::Succeeded { message },
                Err(err) => ReconciliationEvent::Failed {
                    message: err.to_string(),
                },
            };
            // the receiver is gone once the view is torn down; nothing left
            // to update in that case
            let _ = event_tx.send(event);
        });
    }

    pub fn apply(&mut self, event: ReconciliationEvent) {
        match event {
            ReconciliationEvent::Succeeded { message } => {
                self.state = ReconciliationState::Succeeded;
                self.notifier.success(&message);
                self.schedule_reload();
            }
            ReconciliationEvent::Failed { message } => {
                self.state = ReconciliationState::Failed;
                warn!(%message, "failed-tasks check failed");
                self.notifier.error(&message);
                // a failed check is immediately retryable
                self.state = ReconciliationState::Idle;
            }
            ReconciliationEvent::ReloadDue => {
                if self.state == ReconciliationState::Succeeded {
                    self.reloader.reload();
                    self.state = ReconciliationState::Idle;
                }
            }
        }
    }

    fn schedule_reload(&self) {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            time::sleep(RELOAD_NOTICE_DELAY).await;
            let _ = event_tx.send(ReconciliationEvent::ReloadDue);
        });
    }
}

/// Render-ready view of the profile page.
#[derive(Clone, Debug)]
pub struct ProfileSnapshot {
    pub profile: Option<UserProfile>,
    pub active_tab: BetCategory,
    pub bets: Vec<Bet>,
    pub selected_bet: usize,
    pub reconciliation: ReconciliationState,
}

pub struct ProfileViewController<Backend, Notify, Nav, Reload> {
    backend: Backend,
    notifier: Notify,
    navigator: Nav,
    profile: Option<UserProfile>,
    active_tab: BetCategory,
    selected_bet: usize,
    reconciliation: TaskReconciliationController<Backend, Notify, Reload>,
}

impl<Backend, Notify, Nav, Reload> ProfileViewController<Backend, Notify, Nav, Reload>
where
    Backend: Clone,
    Notify: Clone,
{
    pub fn new(
        backend: Backend,
        notifier: Notify,
        navigator: Nav,
        reloader: Reload,
    ) -> (Self, mpsc::UnboundedReceiver<ReconciliationEvent>) {
        let (reconciliation, reconciliation_events) =
            TaskReconciliationController::new(backend.clone(), notifier.clone(), reloader);
        let controller = Self {
            backend,
            notifier,
            navigator,
            profile: None,
            active_tab: BetCategory::default(),
            selected_bet: 0,
            reconciliation,
        };
        (controller, reconciliation_events)
    }
}

impl<Backend, Notify, Nav, Reload> ProfileViewController<Backend, Notify, Nav, Reload>
where
    Backend: BackendApi + Clone + Send + 'static,
    Notify: Notifier + Clone,
    Nav: Navigator,
    Reload: Reloader,
{
    /// The one profile fetch per mount. A failure leaves the view on the
    /// loading placeholder for good; there is no retry affordance.
    pub async fn load_profile(&mut self) {
        let fetched = self.backend.fetch_me().await;
        match fetched {
            Ok(profile) => {
                tracing::info!(username = %profile.username, "profile loaded");
                self.profile = Some(profile);
            }
            Err(err) => {
                error!(error = %err, "profile fetch failed");
                self.notifier.error("Failed to load profile.");
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.profile.is_some()
    }

    pub fn select_tab(&mut self, category: BetCategory) {
        self.active_tab = category;
        self.selected_bet = 0;
    }

    pub fn select_next_tab(&mut self) {
        self.select_tab(self.active_tab.next());
    }

    pub fn select_prev_tab(&mut self) {
        self.select_tab(self.active_tab.prev());
    }

    pub fn select_next_bet(&mut self) {
        let len = self.active_bets_len();
        if len > 0 {
            self.selected_bet = (self.selected_bet + 1).min(len - 1);
        }
    }

    pub fn select_prev_bet(&mut self) {
        self.selected_bet = self.selected_bet.saturating_sub(1);
    }

    pub fn open_selected_bet(&self) {
        let Some(profile) = &self.profile else {
            return;
        };
        let Some(bet) = profile.bets_for(self.active_tab).get(self.selected_bet)
        else {
            return;
        };
        self.navigator.go_to(&format!("/bet/{}", bet.id));
    }

    pub fn check_failed_tasks(&mut self) {
        self.reconciliation.trigger();
    }

    pub fn apply_reconciliation_event(&mut self, event: ReconciliationEvent) {
        self.reconciliation.apply(event);
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        let bets = self
            .profile
            .as_ref()
            .map(|profile| profile.bets_for(self.active_tab).to_vec())
            .unwrap_or_default();
        ProfileSnapshot {
            profile: self.profile.clone(),
            active_tab: self.active_tab,
            selected_bet: self.selected_bet.min(bets.len().saturating_sub(1)),
            bets,
            reconciliation: self.reconciliation.state(),
        }
    }

    fn active_bets_len(&self) -> usize {
        self.profile
            .as_ref()
            .map(|profile| profile.bets_for(self.active_tab).len())
            .unwrap_or_default()
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let api = ApiClient::new(&config.base_url)?;
    let (platform, platform_events) = UiPlatform::channel();
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!(backend = %api, "starting profile dashboard");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(
        api,
        platform,
        platform_events,
        &mut ui_state,
        &mut input_events,
    )
    .await;
    ui::terminal_exit()?;
    res
}

fn mount(
    api: &ApiClient,
    platform: &UiPlatform,
) -> (
    ProfileViewController<ApiClient, UiPlatform, UiPlatform, UiPlatform>,
    mpsc::UnboundedReceiver<ReconciliationEvent>,
) {
    ProfileViewController::new(
        api.clone(),
        platform.clone(),
        platform.clone(),
        platform.clone(),
    )
}

async fn run_loop(
    api: ApiClient,
    platform: UiPlatform,
    mut platform_events: mpsc::UnboundedReceiver<PlatformEvent>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    let (mut controller, mut reconciliation_events) = mount(&api, &platform);
    ui::draw(ui_state, &controller.snapshot())?;
    controller.load_profile().await;
    ui::draw(ui_state, &controller.snapshot())?;

    loop {
        tokio::select! {
            maybe_event = reconciliation_events.recv() => {
                let Some(event) = maybe_event else {
                    warn!("reconciliation channel closed");
                    break;
                };
                controller.apply_reconciliation_event(event);
                ui::draw(ui_state, &controller.snapshot())?;
            }
            maybe_event = platform_events.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                match event {
                    PlatformEvent::Toast { kind, message } => {
                        ui_state.push_toast(kind, message);
                        ui::draw(ui_state, &controller.snapshot())?;
                    }
                    PlatformEvent::Navigate { path } => {
                        // routing is outside this client; surface the target
                        tracing::info!(%path, "navigation requested");
                        ui_state.set_route_hint(path);
                        ui::draw(ui_state, &controller.snapshot())?;
                    }
                    PlatformEvent::Reload => {
                        tracing::info!("full reload requested");
                        let (fresh, fresh_events) = mount(&api, &platform);
                        controller = fresh;
                        reconciliation_events = fresh_events;
                        ui_state.reset_session();
                        ui::draw(ui_state, &controller.snapshot())?;
                        controller.load_profile().await;
                        ui::draw(ui_state, &controller.snapshot())?;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_event = ui::next_raw_event(input_events) => {
                let event = raw_event?;
                let Some(user_event) = ui::interpret_event(event) else {
                    continue;
                };
                if !controller.is_loaded() {
                    // only the loading placeholder is on screen; no tabs,
                    // no action button
                    if matches!(user_event, ui::UserEvent::Quit) {
                        break;
                    }
                    continue;
                }
                match user_event {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::NextTab => controller.select_next_tab(),
                    ui::UserEvent::PrevTab => controller.select_prev_tab(),
                    ui::UserEvent::NextBet => controller.select_next_bet(),
                    ui::UserEvent::PrevBet => controller.select_prev_bet(),
                    ui::UserEvent::OpenBet => controller.open_selected_bet(),
                    ui::UserEvent::CheckFailedTasks => controller.check_failed_tasks(),
                    ui::UserEvent::Redraw => {}
                }
                ui::draw(ui_state, &controller.snapshot())?;
            }
        }
    }
    Ok(())
}
