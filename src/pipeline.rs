use crate::config::SegmentationConfig;
use crate::error::Result;
use crate::loader::SpreadsheetLoader;
use crate::models::CustomerDataset;
use crate::processor::{
    ActionTable, ClassifiedCustomer, CustomerClassifier, CustomerLookup, CustomerReport, GoalTable,
    MonthPair, ReportBuilder, SchemaNormalizer, Segment, SegmentFilter, SegmentQuery,
};
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::info;

/// Load -> normalize -> classify -> segment/report, with the goal and
/// action tables built once from configuration.
pub struct SegmentationPipeline {
    config: SegmentationConfig,
    normalizer: SchemaNormalizer,
    classifier: CustomerClassifier,
    actions: ActionTable,
    goals: GoalTable,
}

impl SegmentationPipeline {
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;

        let normalizer = SchemaNormalizer::new(&config.normalizer)?;
        let classifier = CustomerClassifier::new(&config.classification);
        let actions = ActionTable::from_config(&config)?;
        let goals = GoalTable::from_config(&config);

        info!(
            "Pipeline ready: {} goal categories, segment window {} months",
            goals.len(),
            config.segment.window_months
        );

        Ok(Self {
            config,
            normalizer,
            classifier,
            actions,
            goals,
        })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &SchemaNormalizer {
        &self.normalizer
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn load_file(&self, path: &Path) -> Result<CustomerDataset> {
        let raw = SpreadsheetLoader::load(path)?;
        self.load_frame(&raw)
    }

    pub fn load_frame(&self, raw: &DataFrame) -> Result<CustomerDataset> {
        self.normalizer.normalize(raw)
    }

    pub fn classify<'a>(&self, dataset: &'a CustomerDataset) -> Vec<ClassifiedCustomer<'a>> {
        self.classifier.classify_all(dataset)
    }

    /// Every available category over the configured window, unbounded ranges.
    pub fn default_query(&self, dataset: &CustomerDataset) -> SegmentQuery {
        SegmentQuery::for_categories(dataset.categories(), self.config.segment.window_months)
    }

    pub fn segment<'a>(
        &self,
        dataset: &CustomerDataset,
        population: &[ClassifiedCustomer<'a>],
        query: &SegmentQuery,
    ) -> Segment<'a> {
        SegmentFilter.apply(dataset, population, query)
    }

    pub fn report(
        &self,
        dataset: &CustomerDataset,
        population: &[ClassifiedCustomer<'_>],
        lookup: &CustomerLookup,
    ) -> Result<CustomerReport> {
        self.report_builder().build_for(dataset, population, lookup)
    }

    pub fn report_with_months(
        &self,
        dataset: &CustomerDataset,
        population: &[ClassifiedCustomer<'_>],
        lookup: &CustomerLookup,
        pair: MonthPair,
    ) -> Result<CustomerReport> {
        let customer = crate::processor::find_customer(population, lookup)?;
        Ok(self.report_builder().build(dataset, customer, pair))
    }

    fn report_builder(&self) -> ReportBuilder<'_> {
        ReportBuilder::new(&self.config.report, &self.actions, &self.goals)
    }
}
