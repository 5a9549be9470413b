//! Edge descriptor: a wire from `from.out` to `to.in`.
//!
//! Two reserved port names: `"*"` (star, wildcard over all ports) and `""`
//! (control, carries no data and only orders execution). A `constant` edge
//! delivers into the target's constants, which persist across invocations.

use serde::{Deserialize, Serialize};

/// Star port name: wildcard over every port of a node.
pub(crate) const STAR_PORT: &str = "*";

/// Control port name: carries no data, only ordering.
pub(crate) const CONTROL_PORT: &str = "";

/// A directed, named port-to-port connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the producing node.
    pub from: String,
    /// Id of the consuming node.
    pub to: String,
    /// Output port on `from`. `"*"` selects all outputs, `""` none (control).
    #[serde(default)]
    pub out: String,
    /// Input port on `to`. `"*"` receives all, `""` marks a control edge.
    #[serde(rename = "in", default)]
    pub in_: String,
    /// When set, the delivered value sticks in the target's constants and is
    /// re-read on every future invocation.
    #[serde(default, skip_serializing_if = "is_false")]
    pub constant: bool,
    /// Hint: deliveries over this edge enqueue the target ahead of others.
    #[serde(default, skip_serializing_if = "is_false")]
    pub priority: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Edge {
    /// Plain data edge `from.out -> to.in` with matching port names.
    pub fn new(from: impl Into<String>, to: impl Into<String>, port: impl Into<String>) -> Self {
        let port = port.into();
        Self {
            from: from.into(),
            to: to.into(),
            out: port.clone(),
            in_: port,
            constant: false,
            priority: false,
        }
    }

    /// Data edge with distinct output and input port names.
    pub fn wired(
        from: impl Into<String>,
        out: impl Into<String>,
        to: impl Into<String>,
        in_: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            out: out.into(),
            in_: in_.into(),
            constant: false,
            priority: false,
        }
    }

    /// Star edge `from.* -> to.*`.
    pub fn star(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::wired(from, STAR_PORT, to, STAR_PORT)
    }

    /// Control edge `from -> to`: orders execution, carries no data.
    pub fn control(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::wired(from, CONTROL_PORT, to, CONTROL_PORT)
    }

    /// Marks the edge constant (builder style).
    pub fn as_constant(mut self) -> Self {
        self.constant = true;
        self
    }

    /// Marks the edge priority (builder style).
    pub fn as_priority(mut self) -> Self {
        self.priority = true;
        self
    }

    /// True when the edge only orders execution (`in == ""`).
    pub fn is_control(&self) -> bool {
        self.in_ == CONTROL_PORT
    }

    /// True when the edge selects every output port (`out == "*"`).
    pub fn is_star_out(&self) -> bool {
        self.out == STAR_PORT
    }

    /// True when the edge fans into every input port (`in == "*"`).
    pub fn is_star_in(&self) -> bool {
        self.in_ == STAR_PORT
    }
}
