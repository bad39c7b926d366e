mod graph;

pub use graph::{SceneGraph, SceneTile};
