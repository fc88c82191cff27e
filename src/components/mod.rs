pub mod force_graph;
pub mod legend;
pub mod overlay;
pub mod remediation;
pub mod stack_order;
