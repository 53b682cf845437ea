use crate::config::ReportConfig;
use crate::error::{Result, SegmentError};
use crate::models::{CustomerClass, CustomerDataset, MonthAmount};
use crate::processor::classifier::ClassifiedCustomer;
use crate::processor::goal_evaluator::{GoalEvaluation, GoalEvaluator, MonthPair};
use crate::processor::metrics::{PurchaseMetrics, Window};
use crate::processor::tables::{ActionTable, GoalTable};
use serde::Serialize;
use tracing::info;

pub const NOT_AVAILABLE: &str = "not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerLookup {
    Code(String),
    Name(String),
}

impl CustomerLookup {
    pub fn key(&self) -> &str {
        match self {
            CustomerLookup::Code(key) | CustomerLookup::Name(key) => key,
        }
    }
}

/// First customer matching the lookup. Codes compare trimmed; names
/// compare exactly. A blank key matches nothing.
pub fn find_customer<'p, 'a>(
    population: &'p [ClassifiedCustomer<'a>],
    lookup: &CustomerLookup,
) -> Result<&'p ClassifiedCustomer<'a>> {
    let found = match lookup {
        CustomerLookup::Code(code) => {
            let code = code.trim();
            population
                .iter()
                .find(|c| !code.is_empty() && c.record.code.trim() == code)
        }
        CustomerLookup::Name(name) => population
            .iter()
            .find(|c| !name.trim().is_empty() && c.record.legal_name == *name),
    };

    found.ok_or_else(|| {
        info!("Lookup {:?} matched no customer", lookup);
        SegmentError::CustomerNotFound(lookup.key().to_string())
    })
}

/// Everything the presentation layer needs to render one customer.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerReport {
    pub code: String,
    pub legal_name: String,
    pub category_raw: String,
    pub effective_category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub province: Option<String>,
    pub class: CustomerClass,
    pub action: String,
    pub window_months: usize,
    pub window_total: f64,
    pub window_average: f64,
    pub discount_label: String,
    pub goal: GoalEvaluation,
    pub history: Vec<MonthAmount>,
    pub chart: Vec<MonthAmount>,
}

impl CustomerReport {
    /// Contact field for display, with a placeholder when missing.
    pub fn display_field(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

pub struct ReportBuilder<'a> {
    config: &'a ReportConfig,
    actions: &'a ActionTable,
    goals: &'a GoalTable,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(config: &'a ReportConfig, actions: &'a ActionTable, goals: &'a GoalTable) -> Self {
        Self {
            config,
            actions,
            goals,
        }
    }

    pub fn build(&self, dataset: &CustomerDataset, customer: &ClassifiedCustomer<'_>, pair: MonthPair) -> CustomerReport {
        let record = customer.record;
        let window = PurchaseMetrics::compute(&record.amounts, Window::Last(self.config.window_months));
        let goal = GoalEvaluator::new(self.goals).evaluate(dataset, record, pair);
        let history = dataset.history(record);
        let chart = Window::Last(self.config.chart_months).slice(&history).to_vec();

        CustomerReport {
            code: record.code.clone(),
            legal_name: record.legal_name.clone(),
            category_raw: record.category_raw.clone(),
            effective_category: record.effective_category.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            province: record.province.clone(),
            class: customer.class,
            action: self.actions.action(customer.class).to_string(),
            window_months: window.months,
            window_total: window.total,
            window_average: window.average_inclusive,
            discount_label: goal.discount_label.clone(),
            goal,
            history,
            chart,
        }
    }

    /// Lookup plus report with the default (latest) month pair.
    pub fn build_for(
        &self,
        dataset: &CustomerDataset,
        population: &[ClassifiedCustomer<'_>],
        lookup: &CustomerLookup,
    ) -> Result<CustomerReport> {
        let customer = find_customer(population, lookup)?;
        let pair = MonthPair::latest(dataset)?;
        Ok(self.build(dataset, customer, pair))
    }
}
