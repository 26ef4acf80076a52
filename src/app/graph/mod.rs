mod build;
mod interaction;
mod style;
mod view;

pub(super) use build::{
    DEFAULT_RESULT_LIMIT, DisplayGraph, EdgeKind, FilterParams, NodeKind, build_display_graph,
};
pub(super) use interaction::{InteractionEvent, InteractionPhase, InteractionState};
pub(super) use style::{DEFAULT_LABEL_ZOOM_THRESHOLD, search_matches};
