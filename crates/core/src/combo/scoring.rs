//! Multi-objective scoring of combo candidates

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::combo::metrics::{PairMetrics, PairMetricsTable, SupportTable};
use crate::combo::objectives::ObjectiveWeights;
use crate::combo::retention::AffinitySource;
use crate::combo::side_tables::{InventoryTable, PriceTable};
use crate::domain::level::{Level, PairKey};

/// Weighted contribution of each objective to a combo score
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTerms {
    pub revenue: f64,
    pub inventory: f64,
    pub category_growth: f64,
    pub retention: f64,
    pub lift: f64,
}

impl ScoreTerms {
    pub fn total(&self) -> f64 {
        self.revenue + self.inventory + self.category_growth + self.retention + self.lift
    }
}

/// Intermediate values that only exist at one level
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum LevelDetail {
    Item {
        price_x: Option<Decimal>,
        price_y: Option<Decimal>,
        inventory_x: Option<u64>,
        inventory_y: Option<u64>,
        /// Sum of both prices, missing prices counted as zero
        basket_value: Decimal,
        /// `inventory_y / (inventory_x + 1)`
        overstock_factor: f64,
    },
    Subcategory {
        /// `support_x + support_y`
        category_boost: f64,
    },
    Category {
        category_boost: f64,
    },
}

impl LevelDetail {
    pub fn level(&self) -> Level {
        match self {
            Self::Item { .. } => Level::Item,
            Self::Subcategory { .. } => Level::Subcategory,
            Self::Category { .. } => Level::Category,
        }
    }
}

/// A scored combo candidate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboRecord {
    /// Anchor entity (lexically first)
    pub x: String,
    /// Mover entity (lexically second)
    pub y: String,
    pub pair_count: u64,
    pub support_x: f64,
    pub support_y: f64,
    pub support_xy: f64,
    pub lift: f64,
    /// Retention affinity in `[0, 1)`
    pub affinity: f64,
    pub detail: LevelDetail,
    pub terms: ScoreTerms,
    pub score: f64,
}

impl ComboRecord {
    pub fn level(&self) -> Level {
        self.detail.level()
    }
}

/// Read-only tables the scorer joins against
#[derive(Clone, Copy, Debug)]
pub struct ScoringContext<'a> {
    pub supports: &'a SupportTable,
    pub prices: &'a PriceTable,
    pub inventory: &'a InventoryTable,
}

/// Score calculator for combo candidates
#[derive(Clone, Debug, Default)]
pub struct ComboScorer {
    weights: ObjectiveWeights,
}

impl ComboScorer {
    pub fn new(weights: ObjectiveWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Score every pair of the table and rank the result.
    ///
    /// Pairs are visited in canonical key order so affinity draws are
    /// assigned deterministically.
    pub fn score_pairs(
        &self,
        metrics: &PairMetricsTable,
        context: &ScoringContext<'_>,
        affinity: &mut dyn AffinitySource,
    ) -> Vec<ComboRecord> {
        let level = metrics.level();
        let mut records: Vec<ComboRecord> = metrics
            .sorted()
            .into_iter()
            .map(|(pair, pair_metrics)| {
                self.score_pair(level, pair, pair_metrics, context, affinity)
            })
            .collect();

        rank(&mut records);
        records
    }

    /// Every term is evaluated even when its weight is zero, so the record
    /// always carries the side-table values.
    pub fn score_pair(
        &self,
        level: Level,
        pair: &PairKey,
        pair_metrics: &PairMetrics,
        context: &ScoringContext<'_>,
        affinity: &mut dyn AffinitySource,
    ) -> ComboRecord {
        let (x, y) = (pair.first(), pair.second());
        let support_x = context.supports.support(x);
        let support_y = context.supports.support(y);
        let detail = level_detail(level, x, y, support_x, support_y, context);
        let affinity = affinity.affinity(level, pair);

        let terms = ScoreTerms {
            revenue: self.weights.revenue_growth * revenue_factor(&detail),
            inventory: self.weights.inventory_clearance * overstock_factor(&detail),
            category_growth: category_growth_factor(&detail) * self.weights.category_growth,
            retention: self.weights.customer_retention * affinity,
            lift: self.weights.lift * pair_metrics.lift,
        };

        ComboRecord {
            x: x.to_owned(),
            y: y.to_owned(),
            pair_count: pair_metrics.count,
            support_x,
            support_y,
            support_xy: pair_metrics.support,
            lift: pair_metrics.lift,
            affinity,
            detail,
            score: terms.total(),
            terms,
        }
    }
}

/// Score descending, then `(x, y)` ascending.
pub fn rank(records: &mut [ComboRecord]) {
    records.sort_by(compare_ranked);
}

fn compare_ranked(a: &ComboRecord, b: &ComboRecord) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.x.cmp(&b.x)).then_with(|| a.y.cmp(&b.y))
}

fn level_detail(
    level: Level,
    x: &str,
    y: &str,
    support_x: f64,
    support_y: f64,
    context: &ScoringContext<'_>,
) -> LevelDetail {
    match level {
        Level::Item => {
            let price_x = context.prices.get(x);
            let price_y = context.prices.get(y);
            let inventory_x = context.inventory.get(x);
            let inventory_y = context.inventory.get(y);
            let basket_value =
                price_x.unwrap_or(Decimal::ZERO) + price_y.unwrap_or(Decimal::ZERO);
            let overstock_factor =
                inventory_y.unwrap_or(0) as f64 / (inventory_x.unwrap_or(0) as f64 + 1.0);

            LevelDetail::Item {
                price_x,
                price_y,
                inventory_x,
                inventory_y,
                basket_value,
                overstock_factor,
            }
        }
        Level::Subcategory => LevelDetail::Subcategory { category_boost: support_x + support_y },
        Level::Category => LevelDetail::Category { category_boost: support_x + support_y },
    }
}

fn revenue_factor(detail: &LevelDetail) -> f64 {
    match detail {
        LevelDetail::Item { basket_value, .. } => f64::try_from(*basket_value).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn overstock_factor(detail: &LevelDetail) -> f64 {
    match detail {
        LevelDetail::Item { overstock_factor, .. } => *overstock_factor,
        _ => 0.0,
    }
}

/// Favors pairs drawn from less popular groupings.
fn category_growth_factor(detail: &LevelDetail) -> f64 {
    match detail {
        LevelDetail::Subcategory { category_boost } | LevelDetail::Category { category_boost } => {
            1.0 / (1.0 + category_boost)
        }
        LevelDetail::Item { .. } => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{rank, ComboScorer, LevelDetail, ScoringContext};
    use crate::combo::counter::LevelCounts;
    use crate::combo::metrics::{PairMetricsTable, SupportTable};
    use crate::combo::objectives::ObjectiveWeights;
    use crate::combo::retention::{AffinitySource, PreferenceSignal, RetentionSettings};
    use crate::combo::side_tables::{InventoryTable, PriceTable};
    use crate::domain::level::{Level, PairKey};
    use crate::domain::product::ProductId;

    struct Fixture {
        supports: SupportTable,
        metrics: PairMetricsTable,
        prices: PriceTable,
        inventory: InventoryTable,
    }

    impl Fixture {
        fn new(level: Level, frequencies: &[(&str, u64)], pairs: &[(&str, &str, u64)]) -> Self {
            let counts = LevelCounts {
                frequencies: frequencies.iter().map(|(e, c)| ((*e).to_owned(), *c)).collect(),
                pairs: pairs.iter().map(|(a, b, c)| (PairKey::new(*a, *b), *c)).collect(),
                oversized_transactions: 0,
            };
            let supports =
                SupportTable::from_counts(level, &counts, 4).expect("supports should derive");
            let metrics =
                PairMetricsTable::derive(&supports, &counts.pairs).expect("metrics should derive");
            Self {
                supports,
                metrics,
                prices: PriceTable::default(),
                inventory: InventoryTable::default(),
            }
        }

        fn context(&self) -> ScoringContext<'_> {
            ScoringContext {
                supports: &self.supports,
                prices: &self.prices,
                inventory: &self.inventory,
            }
        }
    }

    struct Constant(f64);

    impl AffinitySource for Constant {
        fn affinity(&mut self, _level: Level, _pair: &PairKey) -> f64 {
            self.0
        }
    }

    fn item_fixture() -> Fixture {
        let mut fixture = Fixture::new(
            Level::Item,
            &[("laptop", 2), ("mouse", 2), ("keyboard", 3)],
            &[("laptop", "mouse", 2), ("keyboard", "mouse", 1)],
        );
        fixture.prices = PriceTable::new([
            (ProductId::from("laptop"), Decimal::new(1000, 0)),
            (ProductId::from("mouse"), Decimal::new(20, 0)),
        ]);
        fixture.inventory = InventoryTable::new([
            (ProductId::from("laptop"), 9),
            (ProductId::from("mouse"), 200),
            (ProductId::from("keyboard"), 150),
        ]);
        fixture
    }

    #[test]
    fn revenue_term_treats_missing_price_as_zero() {
        let fixture = item_fixture();
        let scorer =
            ComboScorer::new(ObjectiveWeights { revenue_growth: 1.0, ..Default::default() });

        let records = scorer.score_pairs(&fixture.metrics, &fixture.context(), &mut Constant(0.0));
        let keyboard_mouse = records
            .iter()
            .find(|record| record.x == "keyboard" && record.y == "mouse")
            .expect("keyboard + mouse should be scored");

        assert_eq!(keyboard_mouse.terms.revenue, 20.0);
        match &keyboard_mouse.detail {
            LevelDetail::Item { price_x, price_y, basket_value, .. } => {
                assert_eq!(*price_x, None);
                assert_eq!(*price_y, Some(Decimal::new(20, 0)));
                assert_eq!(*basket_value, Decimal::new(20, 0));
            }
            other => panic!("expected item detail, got {other:?}"),
        }
    }

    #[test]
    fn inventory_term_rewards_scarce_anchor_with_overstocked_mover() {
        let fixture = item_fixture();
        let scorer =
            ComboScorer::new(ObjectiveWeights { inventory_clearance: 2.0, ..Default::default() });

        let records = scorer.score_pairs(&fixture.metrics, &fixture.context(), &mut Constant(0.0));
        let laptop_mouse = records
            .iter()
            .find(|record| record.x == "laptop")
            .expect("laptop + mouse should be scored");

        // 2.0 * 200 / (9 + 1)
        assert!((laptop_mouse.terms.inventory - 40.0).abs() < 1e-9);
        assert_eq!(laptop_mouse.terms.category_growth, 0.0);
    }

    #[test]
    fn category_growth_applies_only_to_grouping_levels() {
        let fixture = Fixture::new(
            Level::Category,
            &[("Accessories", 2), ("Electronics", 2)],
            &[("Electronics", "Accessories", 1)],
        );
        let scorer = ComboScorer::new(ObjectiveWeights {
            category_growth: 0.5,
            revenue_growth: 10.0,
            inventory_clearance: 10.0,
            ..Default::default()
        });

        let records = scorer.score_pairs(&fixture.metrics, &fixture.context(), &mut Constant(0.0));
        assert_eq!(records.len(), 1);
        let record = &records[0];

        // 0.5 / (1 + 0.5 + 0.5)
        assert!((record.terms.category_growth - 0.25).abs() < 1e-12);
        assert_eq!(record.terms.revenue, 0.0);
        assert_eq!(record.terms.inventory, 0.0);
        assert_eq!(record.detail, LevelDetail::Category { category_boost: 1.0 });
    }

    #[test]
    fn zero_weights_score_zero_and_rank_lexically() {
        let fixture = item_fixture();
        let scorer = ComboScorer::default();

        let records = scorer.score_pairs(&fixture.metrics, &fixture.context(), &mut Constant(0.9));

        assert!(records.iter().all(|record| record.score == 0.0));
        let order: Vec<(&str, &str)> =
            records.iter().map(|record| (record.x.as_str(), record.y.as_str())).collect();
        assert_eq!(order, vec![("keyboard", "mouse"), ("laptop", "mouse")]);
        assert!(records.iter().all(|record| record.affinity == 0.9));
    }

    #[test]
    fn score_is_the_sum_of_all_terms() {
        let fixture = item_fixture();
        let scorer = ComboScorer::new(ObjectiveWeights {
            revenue_growth: 1.0,
            inventory_clearance: 1.0,
            category_growth: 0.5,
            customer_retention: 0.5,
            lift: 3.0,
        });

        let records = scorer.score_pairs(&fixture.metrics, &fixture.context(), &mut Constant(0.5));
        for record in &records {
            let expected = record.terms.revenue
                + record.terms.inventory
                + record.terms.retention
                + record.terms.lift;
            assert!((record.score - expected).abs() < 1e-9);
            assert_eq!(record.terms.retention, 0.25);
            assert!((record.terms.lift - 3.0 * record.lift).abs() < 1e-12);
        }
        assert!(records.windows(2).all(|window| window[0].score >= window[1].score));
    }

    #[test]
    fn retention_uses_the_preference_signal() {
        let fixture = item_fixture();
        let signal =
            PreferenceSignal::new([(Level::Item, PairKey::new("mouse", "laptop"), 0.8)]);
        let mut source = RetentionSettings::default().source_for(Level::Item, &signal);
        let scorer =
            ComboScorer::new(ObjectiveWeights { customer_retention: 1.0, ..Default::default() });

        let records = scorer.score_pairs(&fixture.metrics, &fixture.context(), source.as_mut());

        assert_eq!(records[0].x, "laptop");
        assert_eq!(records[0].score, 0.8);
        assert_eq!(records[1].score, 0.0);
    }

    #[test]
    fn rank_breaks_ties_on_pair_names() {
        let fixture = item_fixture();
        let mut records = ComboScorer::default().score_pairs(
            &fixture.metrics,
            &fixture.context(),
            &mut Constant(0.0),
        );
        records.reverse();
        records[1].score = 1.0;

        rank(&mut records);

        assert_eq!(records[0].score, 1.0);
        assert_eq!(records[1].score, 0.0);
    }

    fn keyboard_mouse(fixture: &Fixture) -> super::ComboRecord {
        let scorer =
            ComboScorer::new(ObjectiveWeights { inventory_clearance: 1.0, ..Default::default() });
        scorer
            .score_pairs(&fixture.metrics, &fixture.context(), &mut Constant(0.0))
            .into_iter()
            .find(|record| record.x == "keyboard" && record.y == "mouse")
            .expect("keyboard + mouse should be scored")
    }

    #[test]
    fn inventory_term_uses_unit_divisor_when_anchor_stock_is_missing() {
        let mut fixture = item_fixture();
        fixture.inventory = InventoryTable::new([(ProductId::from("mouse"), 200)]);

        let record = keyboard_mouse(&fixture);

        assert_eq!(record.terms.inventory, 200.0);
        match &record.detail {
            LevelDetail::Item { inventory_x, inventory_y, overstock_factor, .. } => {
                assert_eq!(*inventory_x, None);
                assert_eq!(*inventory_y, Some(200));
                assert_eq!(*overstock_factor, 200.0);
            }
            other => panic!("expected item detail, got {other:?}"),
        }
    }

    #[test]
    fn inventory_term_is_zero_when_mover_stock_is_missing() {
        let mut fixture = item_fixture();
        fixture.inventory = InventoryTable::new([(ProductId::from("keyboard"), 150)]);

        let record = keyboard_mouse(&fixture);

        assert_eq!(record.terms.inventory, 0.0);
        match &record.detail {
            LevelDetail::Item { inventory_x, inventory_y, .. } => {
                assert_eq!(*inventory_x, Some(150));
                assert_eq!(*inventory_y, None);
            }
            other => panic!("expected item detail, got {other:?}"),
        }
    }

    #[test]
    fn records_serialize_with_tagged_level_detail() {
        let fixture = item_fixture();
        let record = keyboard_mouse(&fixture);

        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["detail"]["level"], "item");
        assert_eq!(json["detail"]["price_x"], serde_json::Value::Null);
        assert_eq!(json["x"], "keyboard");

        let restored: super::ComboRecord =
            serde_json::from_value(json).expect("record should deserialize");
        assert_eq!((restored.x.as_str(), restored.y.as_str()), ("keyboard", "mouse"));
        assert_eq!(restored.pair_count, record.pair_count);
        assert_eq!(restored.level(), Level::Item);
        assert!((restored.score - record.score).abs() < 1e-9);

        let subcategory = LevelDetail::Subcategory { category_boost: 0.5 };
        let json = serde_json::to_string(&subcategory).expect("detail should serialize");
        assert_eq!(json, r#"{"level":"subcategory","category_boost":0.5}"#);
    }
}
