pub mod error;
pub mod flat;
pub mod frustum;
pub mod matrices;
pub mod props;
pub mod resolve;
pub mod viewport;

pub use error::ViewportError;
pub use flat::{FlatProjection, IdentityProjection, WebMercatorProjection};
pub use frustum::{Frustum, Plane};
pub use props::ViewportProps;
pub use viewport::{ProjectOptions, UnprojectOptions, Viewport, ViewportMatrices};
