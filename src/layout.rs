//! Room-name layouts: how grid positions map to room names.
//!
//! Servers differ in how they name their grid, so the resolver is a seam.
//! Resolvers may return ragged rows and gap cells; a gap renders as
//! background fill downstream.

use crate::error::PrinterError;
use crate::matrix::Matrix;
use crate::types::MapSize;
use std::future::Future;

/// Resolves the world's room-name matrix from its size.
pub trait RoomNameResolver: Send + Sync {
    fn resolve(
        &self,
        size: MapSize,
    ) -> impl Future<Output = Result<Matrix<Option<String>>, PrinterError>> + Send;
}

/// Single-quadrant naming used by stock private servers: the whole grid
/// lives in the W/N quadrant with `W0N0` in the bottom-right corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLayout;

impl RoomNameResolver for DefaultLayout {
    async fn resolve(&self, size: MapSize) -> Result<Matrix<Option<String>>, PrinterError> {
        let names = (0..size.height)
            .map(|y| {
                (0..size.width)
                    .map(|x| {
                        Some(format!(
                            "W{}N{}",
                            size.width - 1 - x,
                            size.height - 1 - y
                        ))
                    })
                    .collect()
            })
            .collect();
        Ok(names)
    }
}

/// Four-quadrant centrosymmetric naming used by the official server:
/// `W../E..` around the vertical axis, `N../S..` around the horizontal one.
/// Requires even dimensions; there is no center room to split.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirroredQuadrantLayout;

impl RoomNameResolver for MirroredQuadrantLayout {
    async fn resolve(&self, size: MapSize) -> Result<Matrix<Option<String>>, PrinterError> {
        if size.width % 2 != 0 || size.height % 2 != 0 {
            return Err(PrinterError::OddMapSize {
                width: size.width,
                height: size.height,
            });
        }

        let half_width = size.width / 2;
        let half_height = size.height / 2;

        let names = (0..size.height)
            .map(|y| {
                let vertical = if y < half_height {
                    format!("N{}", half_height - 1 - y)
                } else {
                    format!("S{}", y - half_height)
                };
                (0..size.width)
                    .map(|x| {
                        let horizontal = if x < half_width {
                            format!("W{}", half_width - 1 - x)
                        } else {
                            format!("E{}", x - half_width)
                        };
                        Some(format!("{horizontal}{vertical}"))
                    })
                    .collect()
            })
            .collect();
        Ok(names)
    }
}

/// A fixed, caller-supplied matrix. Useful for partial renders and tests.
#[derive(Debug, Clone)]
pub struct FixedLayout(pub Matrix<Option<String>>);

impl RoomNameResolver for FixedLayout {
    async fn resolve(&self, _size: MapSize) -> Result<Matrix<Option<String>>, PrinterError> {
        Ok(self.0.clone())
    }
}
