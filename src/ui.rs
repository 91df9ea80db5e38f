//! UI layer - builds the menu described by the configuration

use std::collections::HashMap;

use skatolo_ui::{EventBus, MultiList, NodeId};

use crate::config::{ItemConfig, MenuConfig};

/// A menu together with its buttons indexed by name
pub struct Menu {
    pub list: MultiList,
    pub nodes: HashMap<String, NodeId>,
}

/// Create the menu and all of its buttons
pub fn create_menu_from_config(bus: &EventBus, config: &MenuConfig) -> Menu {
    let [x, y] = config.position;
    let mut list = MultiList::new(bus, &config.name, x, y, &config.layout);
    let mut nodes = HashMap::new();
    nodes.insert(config.name.clone(), NodeId::ROOT);
    add_items(bus, &mut list, &mut nodes, NodeId::ROOT, &config.items);
    log::info!("Menu '{}' created with {} buttons", config.name, nodes.len() - 1);
    Menu { list, nodes }
}

fn add_items(
    bus: &EventBus,
    list: &mut MultiList,
    nodes: &mut HashMap<String, NodeId>,
    parent: NodeId,
    items: &[ItemConfig],
) {
    for item in items {
        let Some(id) = list.add_to(bus, parent, &item.name, item.value) else {
            log::warn!("Cannot add '{}', parent is not in the menu", item.name);
            continue;
        };
        if nodes.insert(item.name.clone(), id).is_some() {
            log::warn!("Duplicate menu item '{}', plugs will use the last one", item.name);
        }
        add_items(bus, list, nodes, id, &item.items);
    }
}

/// Center of a button, useful for scripted pointer input
pub fn center_of(list: &MultiList, id: NodeId) -> Option<[f32; 2]> {
    list.bounds(id)
        .map(|b| [b.x + b.width / 2.0, b.y + b.height / 2.0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_menu_from_config() {
        let config = Config::parse(
            r#"
            [[menu.items]]
            name = "tempo"
            value = 1.0
            [[menu.items.items]]
            name = "slow"
            value = 0.25
            [[menu.items]]
            name = "mute"
            value = 1.0
            "#,
        )
        .unwrap();
        let bus = EventBus::new();
        let menu = create_menu_from_config(&bus, &config.menu);

        let tempo = menu.nodes["tempo"];
        let slow = menu.nodes["slow"];
        assert_eq!(menu.list.children(NodeId::ROOT).len(), 2);
        assert_eq!(menu.list.children(tempo), &[slow]);
        assert_eq!(menu.list.node_value(slow), Some(0.25));
        assert_eq!(center_of(&menu.list, tempo), Some([69.5, 29.5]));
    }
}
