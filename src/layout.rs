// SPDX-License-Identifier: GPL-3.0-only

//! Frame-matching layout constraints
//!
//! A constraint reads `item.attribute == related.attribute * multiplier + constant`.
//! Only equality constraints are modelled; that is all the picker needs to pin
//! the preview surface to its container.

/// Opaque view identifier
pub type ViewId = u32;

/// Edge a constraint refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutAttribute {
    Leading,
    Trailing,
    Top,
    Bottom,
}

/// A single equality constraint between two views
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub item: ViewId,
    pub attribute: LayoutAttribute,
    pub related_item: ViewId,
    pub related_attribute: LayoutAttribute,
    pub multiplier: f32,
    pub constant: f32,
}

impl Constraint {
    /// `item.attribute == related_item.attribute`
    pub fn equal(item: ViewId, related_item: ViewId, attribute: LayoutAttribute) -> Self {
        Self {
            item,
            attribute,
            related_item,
            related_attribute: attribute,
            multiplier: 1.0,
            constant: 0.0,
        }
    }
}

/// Axis-aligned frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn edge(&self, attribute: LayoutAttribute) -> f32 {
        match attribute {
            LayoutAttribute::Leading => self.x,
            LayoutAttribute::Trailing => self.x + self.width,
            LayoutAttribute::Top => self.y,
            LayoutAttribute::Bottom => self.y + self.height,
        }
    }
}

/// Constraints making `view` occupy exactly the frame of `matched`
pub fn constraints_to_match(view: ViewId, matched: ViewId) -> Vec<Constraint> {
    [
        LayoutAttribute::Leading,
        LayoutAttribute::Trailing,
        LayoutAttribute::Top,
        LayoutAttribute::Bottom,
    ]
    .into_iter()
    .map(|attribute| Constraint::equal(view, matched, attribute))
    .collect()
}

/// Frame of `view` given constraints relating it to a view whose frame is known
///
/// Returns `None` unless all four edges of `view` are determined by
/// constraints against `reference`.
pub fn resolve(constraints: &[Constraint], view: ViewId, reference: ViewId, frame: Rect) -> Option<Rect> {
    let edge = |attribute: LayoutAttribute| {
        constraints
            .iter()
            .find(|c| c.item == view && c.related_item == reference && c.attribute == attribute)
            .map(|c| frame.edge(c.related_attribute) * c.multiplier + c.constant)
    };

    let left = edge(LayoutAttribute::Leading)?;
    let right = edge(LayoutAttribute::Trailing)?;
    let top = edge(LayoutAttribute::Top)?;
    let bottom = edge(LayoutAttribute::Bottom)?;

    Some(Rect::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0)))
}
