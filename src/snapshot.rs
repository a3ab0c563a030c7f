//! Published engine state
//!
//! The coordinator builds an [`EngineState`] per tick and publishes it as a
//! [`Snapshot`] over a watch channel. Consumers either read the typed state or
//! its flat projection under the historical field keys.

use crate::contract::{ContractType, TempoColor};
use crate::rates::ColorAliases;
use crate::tariff::TariffFigures;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FIELD_CONTRACT_POWER: &str = "contract_power";
pub const FIELD_ACTIVE_RATE: &str = "tarif_actuel_ttc";
pub const FIELD_COLOR_CURRENT: &str = "tempo_couleur";
pub const FIELD_COLOR_NEXT: &str = "tempo_prochaine_couleur";
pub const FIELD_COLOR_YESTERDAY: &str = "tempo_couleur_hier";
pub const FIELD_COLOR_TODAY: &str = "tempo_couleur_aujourdhui";
pub const FIELD_COLOR_TOMORROW: &str = "tempo_couleur_demain";
pub const FIELD_TEMPO_HP: &str = "tempo_variable_hp_ttc";
pub const FIELD_TEMPO_HC: &str = "tempo_variable_hc_ttc";

/// Colors of the three tracked days plus the derived current / next colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TempoDays {
    pub yesterday: Option<TempoColor>,
    pub today: Option<TempoColor>,
    pub tomorrow: Option<TempoColor>,
    pub current: Option<TempoColor>,
    pub next: Option<TempoColor>,
}

/// Everything the engine knows after a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineState {
    pub contract_type: ContractType,
    pub contract_power: String,
    pub figures: Option<TariffFigures>,
    pub tempo: TempoDays,
    /// Prices of the current Tempo color
    pub current_color_rates: ColorAliases,
    pub active_rate: Option<f64>,
    pub last_tariff_refresh_at: Option<NaiveDateTime>,
    pub last_color_refresh_at: Option<NaiveDateTime>,
}

impl EngineState {
    pub fn new(contract_type: ContractType, contract_power: &str) -> Self {
        Self {
            contract_type,
            contract_power: contract_power.to_string(),
            figures: None,
            tempo: TempoDays::default(),
            current_color_rates: ColorAliases::default(),
            active_rate: None,
            last_tariff_refresh_at: None,
            last_color_refresh_at: None,
        }
    }

    /// Flat projection under the published field keys. Unknown values are
    /// left out rather than zeroed.
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        let mut out = BTreeMap::new();
        out.insert(
            FIELD_CONTRACT_POWER.to_string(),
            FieldValue::Text(self.contract_power.clone()),
        );

        if let Some(figures) = &self.figures {
            for (key, value) in figures.named_fields() {
                out.insert(key, FieldValue::Number(value));
            }
        }

        if self.contract_type.uses_colors() {
            let colors = [
                (FIELD_COLOR_YESTERDAY, self.tempo.yesterday),
                (FIELD_COLOR_TODAY, self.tempo.today),
                (FIELD_COLOR_TOMORROW, self.tempo.tomorrow),
                (FIELD_COLOR_CURRENT, self.tempo.current),
                (FIELD_COLOR_NEXT, self.tempo.next),
            ];
            for (key, color) in colors {
                if let Some(color) = color {
                    out.insert(key.to_string(), FieldValue::Text(color.label().to_string()));
                }
            }
            let aliases = [
                (FIELD_TEMPO_HP, self.current_color_rates.hp),
                (FIELD_TEMPO_HC, self.current_color_rates.hc),
            ];
            for (key, value) in aliases {
                if let Some(value) = value {
                    out.insert(key.to_string(), FieldValue::Number(value));
                }
            }
        }

        if let Some(rate) = self.active_rate {
            out.insert(FIELD_ACTIVE_RATE.to_string(), FieldValue::Number(rate));
        }
        out
    }
}

/// Value of a projected field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// What one tick published
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub state: EngineState,
    /// False when the tick that produced this snapshot hit a fetch or parse error
    pub last_update_success: bool,
    pub updated_at: Option<NaiveDateTime>,
    /// Whether any tick so far resolved an active rate
    pub active_rate_seen: bool,
}

impl Snapshot {
    /// Snapshot published before the first tick
    pub fn initial(contract_type: ContractType, contract_power: &str) -> Self {
        Self {
            state: EngineState::new(contract_type, contract_power),
            last_update_success: false,
            updated_at: None,
            active_rate_seen: false,
        }
    }

    /// Fields a consumer should expose for this snapshot
    pub fn catalog(&self) -> Vec<FieldDescriptor> {
        catalog(
            self.state.contract_type,
            &self.state.contract_power,
            self.active_rate_seen,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Monetary,
    Enum,
    Plain,
}

/// Description of a published field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub name: String,
    pub unit: Option<&'static str>,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

impl FieldDescriptor {
    fn monetary(key: &str, name: &str, unit: &'static str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            unit: Some(unit),
            kind: FieldKind::Monetary,
            options: Vec::new(),
        }
    }

    fn color(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            unit: None,
            kind: FieldKind::Enum,
            options: TempoColor::ALL.iter().map(|c| c.label()).collect(),
        }
    }
}

const PER_KWH: &str = "EUR/kWh";
const PER_MONTH: &str = "EUR/mois";

/// Fields published for a contract. `tarif_actuel_ttc` is listed only once an
/// active rate has been resolved at least once.
pub fn catalog(
    contract_type: ContractType,
    contract_power: &str,
    include_active_rate: bool,
) -> Vec<FieldDescriptor> {
    let mut fields = vec![FieldDescriptor {
        key: FIELD_CONTRACT_POWER.to_string(),
        name: format!("Puissance souscrite {} {}kVA", contract_type, contract_power),
        unit: Some("kVA"),
        kind: FieldKind::Plain,
        options: Vec::new(),
    }];

    match contract_type {
        ContractType::Base => fields.extend([
            FieldDescriptor::monetary("base_variable_ttc", "Tarif Base TTC", PER_KWH),
            FieldDescriptor::monetary("base_fixe_ttc", "Tarif Abonnement Base TTC", PER_MONTH),
        ]),
        ContractType::Hphc => fields.extend([
            FieldDescriptor::monetary("hphc_variable_hc_ttc", "Tarif Heures creuses TTC", PER_KWH),
            FieldDescriptor::monetary("hphc_variable_hp_ttc", "Tarif Heures pleines TTC", PER_KWH),
            FieldDescriptor::monetary("hphc_fixe_ttc", "Tarif Abonnement HPHC TTC", PER_MONTH),
        ]),
        ContractType::Tempo => {
            fields.extend([
                FieldDescriptor::color(FIELD_COLOR_CURRENT, "Tarif Tempo Couleur"),
                FieldDescriptor::color(FIELD_COLOR_NEXT, "Tarif Tempo Prochaine Couleur"),
                FieldDescriptor::color(FIELD_COLOR_YESTERDAY, "Tarif Tempo Couleur Hier"),
                FieldDescriptor::color(FIELD_COLOR_TODAY, "Tarif Tempo Couleur Aujourd'hui"),
                FieldDescriptor::color(FIELD_COLOR_TOMORROW, "Tarif Tempo Couleur Demain"),
                FieldDescriptor::monetary(FIELD_TEMPO_HC, "Tarif Tempo Heures creuses TTC", PER_KWH),
                FieldDescriptor::monetary(FIELD_TEMPO_HP, "Tarif Tempo Heures pleines TTC", PER_KWH),
            ]);
            for color in [TempoColor::Blue, TempoColor::Red, TempoColor::White] {
                let label = color.label();
                let mut title = label.to_string();
                if let Some(first) = title.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                fields.push(FieldDescriptor::monetary(
                    &format!("tempo_variable_hc_{}_ttc", label),
                    &format!("Tarif {} Tempo Heures creuses TTC", title),
                    PER_KWH,
                ));
                fields.push(FieldDescriptor::monetary(
                    &format!("tempo_variable_hp_{}_ttc", label),
                    &format!("Tarif {} Tempo Heures pleines TTC", title),
                    PER_KWH,
                ));
            }
            fields.push(FieldDescriptor::monetary(
                "tempo_fixe_ttc",
                "Tarif Abonnement Tempo TTC",
                PER_MONTH,
            ));
        }
    }

    if include_active_rate {
        fields.push(FieldDescriptor::monetary(
            FIELD_ACTIVE_RATE,
            &format!("Tarif actuel {} {}kVA TTC", contract_type, contract_power),
            PER_KWH,
        ));
    }
    fields
}
