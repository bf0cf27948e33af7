//! Features and recommendations from a map dumped by the game server.
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};
use volta_core::{Action, State};

const MISSING_DISTANCE: f32 = 999.0;

/// Identifier of a node or a customer, a string or a number in the dump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Int(i64),
            Float(f64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Str(s) => Id(s),
            Raw::Int(i) => Id(i.to_string()),
            Raw::Float(f) => Id(f.to_string()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Pos {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

/// What a node hosts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Target {
    /// Kind of the target, `"ChargingStation"` for stations.
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,

    /// Charge speed of a single charger.
    #[serde(rename = "chargeSpeedPerCharger", default)]
    pub charge_speed: Option<f64>,

    /// Number of chargers currently free.
    #[serde(rename = "amountOfAvailableChargers", default)]
    pub available_chargers: Option<i64>,
}

/// A customer resident at a node.
#[derive(Debug, Clone, Deserialize)]
pub struct MapCustomer {
    /// Identifier.
    pub id: Id,

    /// Charge left in the battery.
    #[serde(rename = "chargeRemaining", default)]
    pub charge_remaining: Option<f64>,

    /// Capacity of the battery.
    #[serde(rename = "maxCharge", default)]
    pub max_charge: Option<f64>,

    /// Tick at which the customer leaves.
    #[serde(rename = "departureTick", default)]
    pub departure_tick: Option<i64>,

    /// Goal node.
    #[serde(rename = "toNode", default)]
    pub to_node: Option<Id>,
}

/// A node of the map.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    /// Identifier.
    pub id: Id,

    #[serde(rename = "posX", default)]
    pos_x: Option<f64>,

    #[serde(rename = "posY", default)]
    pos_y: Option<f64>,

    #[serde(default)]
    pos: Option<Pos>,

    /// Station hosted by the node, if any.
    #[serde(default)]
    pub target: Option<Target>,

    /// Customers currently at the node.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub customers: Vec<MapCustomer>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<MapCustomer>, D::Error> {
    Ok(Option::<Vec<MapCustomer>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Node {
    /// Coordinates of the node, from `posX`/`posY` or from `pos`.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.pos_x, self.pos_y, &self.pos) {
            (Some(x), Some(y), _) => Some((x, y)),
            (_, _, Some(p)) => Some((p.x, p.y)),
            _ => None,
        }
    }

    /// Whether the node hosts a charging station.
    pub fn is_station(&self) -> bool {
        self.target
            .as_ref()
            .and_then(|t| t.kind.as_deref())
            .map(|k| k == "ChargingStation")
            .unwrap_or(false)
    }

    fn station_rank(&self) -> (f64, i64) {
        let t = self.target.clone().unwrap_or_default();
        (
            t.charge_speed.unwrap_or(0.0),
            t.available_chargers.unwrap_or(0),
        )
    }
}

/// Recommendation for a single customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Customer the recommendation is for.
    pub customer_id: Id,

    /// Action chosen by the policy.
    pub action: Action,

    /// Node the customer should head to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_to: Option<Id>,

    /// Level the customer should charge to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_to: Option<f32>,
}

/// A map dumped by the game server.
#[derive(Debug, Clone, Deserialize)]
pub struct MapSnapshot {
    /// Name of the map.
    #[serde(rename = "name", default)]
    pub name: Option<String>,

    /// Horizon of the game in ticks.
    #[serde(default)]
    pub ticks: i64,

    /// Nodes of the map.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

fn euclid(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => (a.0 - b.0).hypot(a.1 - b.1) as f32,
        _ => MISSING_DISTANCE,
    }
}

impl MapSnapshot {
    /// Loads a map dump from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        Ok(serde_json::from_reader(rdr)?)
    }

    /// Parses a map dump.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    fn stations(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_station())
    }

    /// Diagonal of the bounding box of the stations, at least `1`.
    fn normaliser(&self) -> f32 {
        let coords = self.stations().filter_map(|n| n.coords()).collect::<Vec<_>>();
        if coords.is_empty() {
            return 1.0;
        }
        let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in coords {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        ((x1 - x0).hypot(y1 - y0) as f32).max(1.0)
    }

    /// Station closest to the given node.
    pub fn nearest_station(&self, node: &Node) -> Option<&Node> {
        let pos = node.coords();
        self.stations().min_by(|a, b| {
            euclid(pos, a.coords()).total_cmp(&euclid(pos, b.coords()))
        })
    }

    /// Station with the fastest chargers, ties broken by free chargers.
    pub fn fastest_station(&self) -> Option<&Node> {
        self.stations().max_by(|a, b| {
            let (sa, ca) = a.station_rank();
            let (sb, cb) = b.station_rank();
            sa.total_cmp(&sb).then(ca.cmp(&cb))
        })
    }

    /// Customers in the order their features are extracted.
    pub fn customers(&self) -> impl Iterator<Item = (&Node, &MapCustomer)> {
        self.nodes
            .iter()
            .flat_map(|n| n.customers.iter().map(move |c| (n, c)))
    }

    /// Recomputes the features of every customer at `current_tick`.
    pub fn features(&self, current_tick: i64) -> Vec<State> {
        let coords = self
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.coords()))
            .collect::<HashMap<_, _>>();
        let max_dist = self.normaliser();
        let total_ticks = self.ticks.max(1) as f32;

        self.customers()
            .map(|(node, c)| {
                let max_charge = c.max_charge.unwrap_or(1.0);
                let charge = match max_charge > 0.0 {
                    true => (c.charge_remaining.unwrap_or(0.0) / max_charge) as f32,
                    false => 0.0,
                };
                let departure = c.departure_tick.unwrap_or(self.ticks);
                let ticks_to_depart = (departure - current_tick).max(0) as f32;
                let dist_to_station = euclid(
                    node.coords(),
                    self.nearest_station(node).and_then(|s| s.coords()),
                );
                let goal = c
                    .to_node
                    .as_ref()
                    .and_then(|id| coords.get(id).copied().flatten());
                let dist_to_goal = euclid(node.coords(), goal);

                [
                    charge.clamp(0.0, 1.0),
                    if node.is_station() { 1.0 } else { 0.0 },
                    (ticks_to_depart / total_ticks).clamp(0.0, 1.0),
                    (dist_to_station / max_dist).clamp(0.0, 1.0),
                    (dist_to_goal / max_dist).clamp(0.0, 1.0),
                ]
            })
            .collect()
    }

    /// Turns one action per customer into recommendations.
    ///
    /// Idle customers and customers whose action has no usable station get
    /// no recommendation. Charging away from a station sends the customer to
    /// the fastest station instead.
    pub fn recommend(&self, actions: &[Action]) -> Vec<Recommendation> {
        let fastest = self.fastest_station().map(|n| n.id.clone());
        self.customers()
            .zip(actions.iter())
            .filter_map(|((node, c), &action)| {
                let (path_to, charge_to) = match action {
                    Action::Idle => return None,
                    Action::NearestStation => (Some(self.nearest_station(node)?.id.clone()), None),
                    Action::FastestStation => (Some(fastest.clone()?), None),
                    Action::ChargeTo95 if node.is_station() => (None, Some(0.95)),
                    Action::ChargeTo95 => (Some(fastest.clone()?), None),
                };
                Some(Recommendation {
                    customer_id: c.id.clone(),
                    action,
                    path_to,
                    charge_to,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "name": "Pistonia",
        "ticks": 100,
        "nodes": [
            {"id": "a", "posX": 0, "posY": 0, "customers": [
                {"id": 1, "chargeRemaining": 30, "maxCharge": 60, "departureTick": 40, "toNode": "d"}
            ]},
            {"id": "b", "pos": {"x": 3, "y": 4},
             "target": {"Type": "ChargingStation", "chargeSpeedPerCharger": 50, "amountOfAvailableChargers": 2},
             "customers": [
                {"id": "c2", "chargeRemaining": 70, "maxCharge": 60, "departureTick": 500}
             ]},
            {"id": "c", "posX": 6, "posY": 8,
             "target": {"Type": "ChargingStation", "chargeSpeedPerCharger": 150, "amountOfAvailableChargers": 1},
             "customers": null},
            {"id": "d", "posX": 30, "posY": 40}
        ]
    }"#;

    #[test]
    fn test_features() -> Result<()> {
        let map = MapSnapshot::from_json(MAP)?;
        let feats = map.features(10);
        assert_eq!(feats.len(), 2);

        // Stations span a diagonal of 5
        let f = feats[0];
        assert!((f[0] - 0.5).abs() < 1e-6);
        assert_eq!(f[1], 0.0);
        assert!((f[2] - 0.3).abs() < 1e-6);
        assert!((f[3] - 1.0).abs() < 1e-6);
        assert_eq!(f[4], 1.0);

        let f = feats[1];
        assert_eq!(f[0], 1.0);
        assert_eq!(f[1], 1.0);
        assert_eq!(f[2], 1.0);
        assert_eq!(f[3], 0.0);

        // Customer without goal is treated as far away
        assert_eq!(f[4], 1.0);
        Ok(())
    }

    #[test]
    fn test_stations() -> Result<()> {
        let map = MapSnapshot::from_json(MAP)?;
        assert_eq!(map.nearest_station(&map.nodes[0]).unwrap().id, Id("b".into()));
        assert_eq!(map.fastest_station().unwrap().id, Id("c".into()));
        Ok(())
    }

    #[test]
    fn test_recommend() -> Result<()> {
        let map = MapSnapshot::from_json(MAP)?;
        let recs = map.recommend(&[Action::ChargeTo95, Action::ChargeTo95]);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].customer_id, Id("1".into()));
        assert_eq!(recs[0].path_to, Some(Id("c".into())));
        assert_eq!(recs[1].charge_to, Some(0.95));
        assert!(map.recommend(&[Action::Idle]).is_empty());

        let json = serde_json::to_string(&recs[1])?;
        assert_eq!(
            json,
            r#"{"customerId":"c2","action":"charge_to_95","chargeTo":0.95}"#
        );
        Ok(())
    }
}
