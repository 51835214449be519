//! Aggregate power balance for the whole factory.
//!
//! Every tick the grid is rebuilt from scratch: consumers add their draw
//! whether or not they are busy, generators add their output only if they
//! could burn this tick's fuel. The ratio of the two, capped at 1, is the
//! single efficiency scalar applied to every power-consuming building.
//!
//! # Design
//!
//! - One global grid, no wiring or networks.
//! - No storage: surplus is lost, deficit throttles uniformly.
//! - Events fire only on *transitions*, not every tick.

use gridforge_core::catalog::{BuildingSpec, Fuel};
use gridforge_core::fixed::{Fixed64, Seconds, Ticks, clamped_ratio};
use gridforge_core::ledger::ResourceLedger;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-building power contribution
// ---------------------------------------------------------------------------

/// What one placed building contributes to the balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerNode {
    /// Draw, charged unconditionally.
    pub consumption: Fixed64,
    /// Nominal output, granted only if `fuel` can be paid.
    pub production: Fixed64,
    pub fuel: Option<Fuel>,
}

impl PowerNode {
    /// The node for a building of this spec, or `None` if the kind neither
    /// draws nor produces power.
    pub fn from_spec(spec: &BuildingSpec) -> Option<Self> {
        if spec.power_consumption.is_none() && spec.power_production.is_none() {
            return None;
        }
        Some(Self {
            consumption: spec.power_consumption.unwrap_or(Fixed64::ZERO),
            production: spec.power_production.unwrap_or(Fixed64::ZERO),
            fuel: spec.fuel.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Power events
// ---------------------------------------------------------------------------

/// Emitted when the grid crosses the brownout threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerEvent {
    /// Production fell below consumption.
    Brownout {
        /// consumption - production
        deficit: Fixed64,
        tick: Ticks,
    },
    /// Production caught up with consumption again.
    Restored { tick: Ticks },
}

// ---------------------------------------------------------------------------
// Power grid
// ---------------------------------------------------------------------------

/// Per-tick totals and the derived efficiency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerGrid {
    pub total_production: Fixed64,
    pub total_consumption: Fixed64,
    /// `min(1, production / consumption)`, or 1 with no consumption.
    pub efficiency: Fixed64,
    /// Brownout state after the last settle, for transition detection.
    was_brownout: bool,
}

impl Default for PowerGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerGrid {
    pub fn new() -> Self {
        Self {
            total_production: Fixed64::ZERO,
            total_consumption: Fixed64::ZERO,
            efficiency: Fixed64::ONE,
            was_brownout: false,
        }
    }

    /// Whether the last settle left consumers under-supplied.
    pub fn is_brownout(&self) -> bool {
        self.was_brownout
    }

    /// Unmet demand after the last settle, zero when fully supplied.
    pub fn deficit(&self) -> Fixed64 {
        (self.total_consumption - self.total_production).max(Fixed64::ZERO)
    }

    /// Rebuild the balance from `nodes`, burning fuel from `ledger` for
    /// `dt` seconds of operation.
    ///
    /// A generator whose fuel counter holds less than `per_second * dt`
    /// contributes nothing and is charged nothing. Consumption is summed
    /// regardless of what the consumer is doing.
    ///
    /// Returns the transition events produced by this settle.
    pub fn settle<I>(
        &mut self,
        nodes: I,
        ledger: &mut ResourceLedger,
        dt: Seconds,
        tick: Ticks,
    ) -> Vec<PowerEvent>
    where
        I: IntoIterator<Item = PowerNode>,
    {
        let mut production = Fixed64::ZERO;
        let mut consumption = Fixed64::ZERO;

        for node in nodes {
            if node.consumption > Fixed64::ZERO {
                consumption = consumption.saturating_add(node.consumption);
            }
            if node.production <= Fixed64::ZERO {
                continue;
            }
            let fuelled = match &node.fuel {
                None => true,
                Some(fuel) => {
                    let burn = fuel.per_second.saturating_mul(dt.max(Fixed64::ZERO));
                    ledger.try_debit(fuel.resource, burn).is_ok()
                }
            };
            if fuelled {
                production = production.saturating_add(node.production);
            }
        }

        self.total_production = production;
        self.total_consumption = consumption;
        self.efficiency = clamped_ratio(production, consumption);

        tracing::trace!(
            tick,
            production = %production,
            consumption = %consumption,
            efficiency = %self.efficiency,
            "power settled"
        );

        let mut events = Vec::new();
        let is_brownout = self.efficiency < Fixed64::ONE;
        if is_brownout && !self.was_brownout {
            let deficit = self.deficit();
            tracing::debug!(tick, deficit = %deficit, "power brownout");
            events.push(PowerEvent::Brownout { deficit, tick });
        } else if !is_brownout && self.was_brownout {
            tracing::debug!(tick, "power restored");
            events.push(PowerEvent::Restored { tick });
        }
        self.was_brownout = is_brownout;

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridforge_core::catalog::Catalog;
    use gridforge_core::id::{BuildingKind, Resource};
    use gridforge_core::test_utils::{fixed, ledger_with};

    fn consumer(draw: f64) -> PowerNode {
        PowerNode {
            consumption: fixed(draw),
            production: Fixed64::ZERO,
            fuel: None,
        }
    }

    fn solar(output: f64) -> PowerNode {
        PowerNode {
            consumption: Fixed64::ZERO,
            production: fixed(output),
            fuel: None,
        }
    }

    fn coal_generator() -> PowerNode {
        PowerNode::from_spec(Catalog::standard().get(BuildingKind::CoalGenerator))
            .expect("coal generator is a power node")
    }

    // -----------------------------------------------------------------------
    // Test 1: No consumers means full efficiency
    // -----------------------------------------------------------------------
    #[test]
    fn no_consumption_is_full_efficiency() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();
        let events = grid.settle(vec![solar(2.0)], &mut ledger, fixed(0.5), 1);
        assert_eq!(grid.efficiency, Fixed64::ONE);
        assert_eq!(grid.total_production, fixed(2.0));
        assert!(events.is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 2: Partial supply gives a proportional ratio
    // -----------------------------------------------------------------------
    #[test]
    fn partial_supply_ratio() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();
        grid.settle(vec![solar(2.0), consumer(4.0)], &mut ledger, fixed(0.5), 1);
        assert_eq!(grid.efficiency, fixed(0.5));
        assert_eq!(grid.deficit(), fixed(2.0));
    }

    // -----------------------------------------------------------------------
    // Test 3: Surplus is capped at 1
    // -----------------------------------------------------------------------
    #[test]
    fn surplus_caps_at_one() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();
        grid.settle(vec![solar(50.0), consumer(3.0)], &mut ledger, fixed(0.5), 1);
        assert_eq!(grid.efficiency, Fixed64::ONE);
        assert_eq!(grid.deficit(), Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 4: Unfuelled generator contributes nothing
    // -----------------------------------------------------------------------
    #[test]
    fn generator_without_fuel_contributes_zero() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();
        let furnace = PowerNode::from_spec(Catalog::standard().get(BuildingKind::Furnace)).unwrap();
        grid.settle(vec![coal_generator(), furnace], &mut ledger, fixed(0.25), 1);
        assert_eq!(grid.total_production, Fixed64::ZERO);
        assert_eq!(grid.total_consumption, fixed(3.0));
        assert_eq!(grid.efficiency, Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 5: Fuel is burned per second of dt
    // -----------------------------------------------------------------------
    #[test]
    fn generator_burns_fuel_for_dt() {
        let mut grid = PowerGrid::new();
        let mut ledger = ledger_with(&[(Resource::Coal, 1)]);
        grid.settle(vec![coal_generator()], &mut ledger, fixed(0.5), 1);
        assert_eq!(grid.total_production, fixed(10.0));
        assert!(ledger.amount(Resource::Coal) < fixed(1.0));
        assert!(ledger.amount(Resource::Coal) > fixed(0.9));
    }

    #[test]
    fn fuel_not_charged_when_short() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();
        ledger.credit(Resource::Coal, fixed(0.0078125));
        grid.settle(vec![coal_generator()], &mut ledger, fixed(1.0), 1);
        assert_eq!(grid.total_production, Fixed64::ZERO);
        assert_eq!(ledger.amount(Resource::Coal), fixed(0.0078125));
    }

    #[test]
    fn reactor_burns_uranium() {
        let reactor = PowerNode::from_spec(Catalog::standard().get(BuildingKind::NuclearReactor))
            .expect("reactor is a power node");
        let burn = reactor
            .fuel
            .as_ref()
            .map(|f| f.per_second.saturating_mul(fixed(0.5)))
            .unwrap_or(Fixed64::ZERO);
        assert!(burn > Fixed64::ZERO);

        let mut grid = PowerGrid::new();
        let mut ledger = ledger_with(&[(Resource::Uranium, 1)]);
        grid.settle(vec![reactor.clone(), consumer(20.0)], &mut ledger, fixed(0.5), 1);
        assert_eq!(grid.total_production, fixed(50.0));
        assert_eq!(grid.efficiency, Fixed64::ONE);
        assert_eq!(ledger.amount(Resource::Uranium), fixed(1.0) - burn);

        // Not enough left for another half second: the reactor goes dark.
        ledger.set(Resource::Uranium, burn - Fixed64::DELTA);
        grid.settle(vec![reactor, consumer(20.0)], &mut ledger, fixed(0.5), 2);
        assert_eq!(grid.total_production, Fixed64::ZERO);
        assert_eq!(grid.efficiency, Fixed64::ZERO);
        assert_eq!(ledger.amount(Resource::Uranium), burn - Fixed64::DELTA);
    }

    // -----------------------------------------------------------------------
    // Test 6: Consumers never add to production
    // -----------------------------------------------------------------------
    #[test]
    fn consumers_do_not_produce() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();
        grid.settle(
            vec![consumer(2.0), consumer(6.0), consumer(8.0)],
            &mut ledger,
            fixed(0.5),
            1,
        );
        assert_eq!(grid.total_production, Fixed64::ZERO);
        assert_eq!(grid.total_consumption, fixed(16.0));
    }

    // -----------------------------------------------------------------------
    // Test 7: Events on transitions only
    // -----------------------------------------------------------------------
    #[test]
    fn brownout_and_restore_fire_once() {
        let mut grid = PowerGrid::new();
        let mut ledger = ResourceLedger::new();

        let events = grid.settle(vec![consumer(4.0), solar(2.0)], &mut ledger, fixed(0.5), 1);
        assert_eq!(
            events,
            vec![PowerEvent::Brownout {
                deficit: fixed(2.0),
                tick: 1
            }]
        );
        assert!(grid.is_brownout());

        let events = grid.settle(vec![consumer(4.0), solar(2.0)], &mut ledger, fixed(0.5), 2);
        assert!(events.is_empty());

        let events = grid.settle(vec![consumer(4.0), solar(4.0)], &mut ledger, fixed(0.5), 3);
        assert_eq!(events, vec![PowerEvent::Restored { tick: 3 }]);
        assert!(!grid.is_brownout());
    }

    #[test]
    fn unpowered_kinds_have_no_node() {
        let catalog = Catalog::standard();
        assert!(PowerNode::from_spec(catalog.get(BuildingKind::Conveyor)).is_none());
        assert!(PowerNode::from_spec(catalog.get(BuildingKind::Lab)).is_some());
    }
}
