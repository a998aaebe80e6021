//! Estimator wizard state manager
//!
//! Holds the current wizard step, the selected service and the form values,
//! and decides which step follows which. Changes are published on a
//! broadcast channel so any number of observers can follow along; dropping a
//! receiver unsubscribes it.

use crate::pricing::{BoatType, EstimateRequest, HullType, LastCleaned, LastPainted, RateType, ServiceKey};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Wizard steps in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    ServiceSelection = 0,
    BoatLength = 1,
    BoatType = 2,
    HullType = 3,
    EngineConfig = 4,
    PaintAge = 5,
    LastCleaned = 6,
    Anodes = 7,
    Results = 8,
}

impl WizardStep {
    const ORDER: [WizardStep; 9] = [
        WizardStep::ServiceSelection,
        WizardStep::BoatLength,
        WizardStep::BoatType,
        WizardStep::HullType,
        WizardStep::EngineConfig,
        WizardStep::PaintAge,
        WizardStep::LastCleaned,
        WizardStep::Anodes,
        WizardStep::Results,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    fn following(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(WizardStep::ServiceSelection)
    }

    fn preceding(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(WizardStep::ServiceSelection)
    }
}

/// Values collected by the wizard form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub boat_length: f64,
    pub boat_type: BoatType,
    pub hull_type: HullType,
    pub twin_engines: bool,
    pub last_painted: LastPainted,
    pub last_cleaned: LastCleaned,
    pub anodes_to_install: u32,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            boat_length: 30.0,
            boat_type: BoatType::Sailboat,
            hull_type: HullType::Monohull,
            twin_engines: false,
            last_painted: LastPainted::UpTo6Months,
            last_cleaned: LastCleaned::UpTo2Months,
            anodes_to_install: 0,
        }
    }
}

/// Single form field update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FormField {
    BoatLength(f64),
    BoatType(BoatType),
    HullType(HullType),
    TwinEngines(bool),
    LastPainted(LastPainted),
    LastCleaned(LastCleaned),
    AnodesToInstall(u32),
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::BoatLength(_) => "boatLength",
            FormField::BoatType(_) => "boatType",
            FormField::HullType(_) => "hullType",
            FormField::TwinEngines(_) => "twinEngines",
            FormField::LastPainted(_) => "lastPainted",
            FormField::LastCleaned(_) => "lastCleaned",
            FormField::AnodesToInstall(_) => "anodesToInstall",
        }
    }
}

/// Order summary carried into checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub estimate: f64,
    pub service: String,
    pub boat_length: f64,
    pub service_details: serde_json::Value,
}

/// Complete wizard state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: WizardStep,
    pub selected_service: Option<ServiceKey>,
    pub form_values: FormValues,
    pub selected_service_interval: Option<String>,
    pub order_data: OrderData,
    pub is_checkout_visible: bool,
    pub is_calculating: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::ServiceSelection,
            selected_service: None,
            form_values: FormValues::default(),
            selected_service_interval: None,
            order_data: OrderData::default(),
            is_checkout_visible: false,
            is_calculating: false,
        }
    }
}

/// Partial update applied by [`StateManager::update`]
#[derive(Debug, Clone, Default)]
pub struct WizardPatch {
    pub current_step: Option<WizardStep>,
    pub selected_service: Option<Option<ServiceKey>>,
    pub selected_service_interval: Option<Option<String>>,
    pub order_data: Option<OrderData>,
    pub is_checkout_visible: Option<bool>,
    pub is_calculating: Option<bool>,
}

/// Notifications published by the state manager
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    StateChanged,
    StepChanged { old_step: WizardStep, new_step: WizardStep },
    ServiceChanged { old_service: Option<ServiceKey>, new_service: Option<ServiceKey> },
    FormValueChanged { field: &'static str },
    Reset,
}

/// Observable wizard store
pub struct StateManager {
    state: WizardState,
    tx: broadcast::Sender<WizardEvent>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            state: WizardState::default(),
            tx,
        }
    }

    /// Snapshot of the current state
    pub fn get(&self) -> &WizardState {
        &self.state
    }

    /// Receive all future notifications
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.tx.subscribe()
    }

    fn emit(&self, event: WizardEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    /// Apply a patch and notify observers
    ///
    /// StepChanged and ServiceChanged fire only when the value really changes.
    pub fn update(&mut self, patch: WizardPatch) {
        let old_step = self.state.current_step;
        let old_service = self.state.selected_service;

        if let Some(step) = patch.current_step {
            self.state.current_step = step;
        }
        if let Some(service) = patch.selected_service {
            self.state.selected_service = service;
        }
        if let Some(interval) = patch.selected_service_interval {
            self.state.selected_service_interval = interval;
        }
        if let Some(order) = patch.order_data {
            self.state.order_data = order;
        }
        if let Some(visible) = patch.is_checkout_visible {
            self.state.is_checkout_visible = visible;
        }
        if let Some(calculating) = patch.is_calculating {
            self.state.is_calculating = calculating;
        }

        self.emit(WizardEvent::StateChanged);

        if self.state.current_step != old_step {
            self.emit(WizardEvent::StepChanged {
                old_step,
                new_step: self.state.current_step,
            });
        }

        if self.state.selected_service != old_service {
            self.emit(WizardEvent::ServiceChanged {
                old_service,
                new_service: self.state.selected_service,
            });
        }
    }

    pub fn update_form_value(&mut self, field: FormField) {
        let name = field.name();
        let form = &mut self.state.form_values;
        match field {
            FormField::BoatLength(v) => form.boat_length = v,
            FormField::BoatType(v) => form.boat_type = v,
            FormField::HullType(v) => form.hull_type = v,
            FormField::TwinEngines(v) => form.twin_engines = v,
            FormField::LastPainted(v) => form.last_painted = v,
            FormField::LastCleaned(v) => form.last_cleaned = v,
            FormField::AnodesToInstall(v) => form.anodes_to_install = v,
        }
        self.emit(WizardEvent::StateChanged);
        self.emit(WizardEvent::FormValueChanged { field: name });
    }

    pub fn reset(&mut self) {
        self.state = WizardState::default();
        self.emit(WizardEvent::StateChanged);
        self.emit(WizardEvent::Reset);
    }

    fn service_type(&self) -> Option<RateType> {
        self.state.selected_service.map(|k| k.definition().rate_type)
    }

    /// Step the Next button leads to
    pub fn next_step(&self) -> WizardStep {
        use WizardStep::*;

        let step = self.state.current_step;
        let service = self.state.selected_service;

        if step == Results {
            return ServiceSelection;
        }

        if step == ServiceSelection {
            match (service, self.service_type()) {
                (Some(ServiceKey::UnderwaterInspection), _) => return BoatLength,
                (Some(ServiceKey::ItemRecovery), _) => return Results,
                (_, Some(RateType::Flat)) => return Anodes,
                (_, Some(RateType::PerFoot)) => return BoatLength,
                _ => {}
            }
        }

        if service == Some(ServiceKey::UnderwaterInspection) {
            match step {
                BoatLength => return HullType,
                HullType => return Results,
                _ => {}
            }
        }

        step.following()
    }

    /// Step the Back button leads to
    pub fn previous_step(&self) -> WizardStep {
        use WizardStep::*;

        let step = self.state.current_step;
        let service = self.state.selected_service;

        if step == ServiceSelection {
            return ServiceSelection;
        }

        if step == Anodes && self.service_type() == Some(RateType::Flat) {
            return ServiceSelection;
        }

        if step == Results && service == Some(ServiceKey::ItemRecovery) {
            return ServiceSelection;
        }

        if service == Some(ServiceKey::UnderwaterInspection) {
            match step {
                Results => return HullType,
                HullType => return BoatLength,
                BoatLength => return ServiceSelection,
                _ => {}
            }
        }

        step.preceding()
    }

    /// Whether the Next button is enabled
    pub fn can_proceed(&self) -> bool {
        match self.state.current_step {
            WizardStep::ServiceSelection => self.state.selected_service.is_some(),
            WizardStep::BoatLength => self.state.form_values.boat_length > 0.0,
            _ => true,
        }
    }

    /// Label for the Next button
    pub fn next_button_text(&self) -> &'static str {
        use WizardStep::*;

        let step = self.state.current_step;
        let service = self.state.selected_service;

        if step == Results {
            return "Start Over";
        }

        if step == ServiceSelection {
            return match (service, self.service_type()) {
                (None, _) => "Next",
                (_, Some(RateType::PerFoot)) => "Next (Boat Length)",
                (Some(ServiceKey::ItemRecovery), _) => "View Estimate",
                _ => "Next (Anodes)",
            };
        }

        if service == Some(ServiceKey::UnderwaterInspection) {
            match step {
                BoatLength => return "Next (Hull Type)",
                HullType => return "View Estimate",
                _ => {}
            }
        }

        match step {
            BoatLength => "Next (Boat Type)",
            BoatType => "Next (Hull Type)",
            HullType => "Next (Engine Config)",
            EngineConfig => "Next (Paint Age)",
            PaintAge => "Next (Last Cleaned)",
            LastCleaned => "Next (Anodes)",
            Anodes => "View Estimate",
            _ => "Next",
        }
    }

    /// Build a pricing request from the current form values
    pub fn estimate_request(&self) -> Option<EstimateRequest> {
        let service = self.state.selected_service?;
        let form = &self.state.form_values;
        Some(EstimateRequest {
            service_key: service.as_str().to_string(),
            boat_length: form.boat_length,
            boat_type: form.boat_type,
            hull_type: form.hull_type,
            has_twin_engines: form.twin_engines,
            last_painted_time: Some(form.last_painted),
            last_cleaned_time: Some(form.last_cleaned),
            anodes_to_install: form.anodes_to_install,
            actual_paint_condition: None,
            actual_growth_level: None,
        })
    }
}
