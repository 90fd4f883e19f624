use tuirealm::ratatui::layout::Rect;

use crate::types::{TaskId, TaskStatus};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InteractionLayer {
    Base,
    Overlay,
}

impl InteractionLayer {
    fn priority(self) -> u8 {
        match self {
            Self::Base => 0,
            Self::Overlay => 1,
        }
    }
}

/// What sits under a screen cell.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HitTarget {
    TaskCard {
        task_id: TaskId,
        /// Top-left cell of the card, used as the drag anchor's element origin.
        origin: (u16, u16),
    },
    Column(TaskStatus),
    PanelHeader,
    PanelBody,
    PanelMinimize,
    PanelHide,
    PanelShow,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InteractionNode {
    pub rect: Rect,
    pub target: HitTarget,
    pub layer: InteractionLayer,
}

impl InteractionNode {
    fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.rect.x
            && col < self.rect.x.saturating_add(self.rect.width)
            && row >= self.rect.y
            && row < self.rect.y.saturating_add(self.rect.height)
    }
}

/// Hit regions registered during the last render.
#[derive(Debug, Default, Clone)]
pub struct InteractionMap {
    nodes: Vec<InteractionNode>,
}

impl InteractionMap {
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn register(&mut self, layer: InteractionLayer, rect: Rect, target: HitTarget) {
        self.nodes.push(InteractionNode {
            rect,
            target,
            layer,
        });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn resolve(&self, col: u16, row: u16) -> Option<HitTarget> {
        self.resolve_node(col, row).map(|node| node.target)
    }

    /// Topmost node under the cell: higher layer first, then the later
    /// registration within a layer.
    pub fn resolve_node(&self, col: u16, row: u16) -> Option<&InteractionNode> {
        let mut best: Option<(usize, &InteractionNode)> = None;
        for (idx, node) in self.nodes.iter().enumerate() {
            if !node.contains(col, row) {
                continue;
            }
            match best {
                None => best = Some((idx, node)),
                Some((best_idx, best_node)) => {
                    let has_higher_layer = node.layer.priority() > best_node.layer.priority();
                    let same_layer_later_registration =
                        node.layer.priority() == best_node.layer.priority() && idx > best_idx;
                    if has_higher_layer || same_layer_later_registration {
                        best = Some((idx, node));
                    }
                }
            }
        }
        best.map(|(_, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64) -> HitTarget {
        HitTarget::TaskCard {
            task_id: TaskId(id),
            origin: (0, 0),
        }
    }

    #[test]
    fn resolve_prefers_higher_layer() {
        let mut map = InteractionMap::default();
        let rect = Rect::new(10, 10, 5, 2);

        map.register(InteractionLayer::Overlay, rect, HitTarget::PanelHeader);
        map.register(InteractionLayer::Base, rect, card(1));

        assert_eq!(map.resolve(11, 10), Some(HitTarget::PanelHeader));
    }

    #[test]
    fn resolve_prefers_latest_within_same_layer() {
        let mut map = InteractionMap::default();
        let rect = Rect::new(4, 4, 4, 1);

        map.register(InteractionLayer::Base, rect, HitTarget::Column(TaskStatus::Todo));
        map.register(InteractionLayer::Base, rect, card(2));

        assert_eq!(map.resolve(5, 4), Some(card(2)));
    }

    #[test]
    fn resolve_misses_outside_every_rect() {
        let mut map = InteractionMap::default();
        map.register(InteractionLayer::Base, Rect::new(0, 0, 3, 3), card(1));

        assert_eq!(map.resolve(3, 0), None);
        assert_eq!(map.resolve(0, 3), None);
    }
}
