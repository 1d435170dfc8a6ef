//! The central registry of protocol numbers.

use hashbrown::HashMap;
use lazy_static::lazy_static;
use mutex::SpinNoIrqLock;

use crate::{LayerId, LayerImplementation};

lazy_static! {
    static ref REGISTRY: SpinNoIrqLock<HashMap<LayerId, &'static dyn LayerImplementation>> = {
        let mut map: HashMap<LayerId, &'static dyn LayerImplementation> = HashMap::new();
        map.insert(
            crate::NULL_LAYER_ID,
            &crate::virtual_layer::VIRTUAL_LAYER_IMPLEMENTATION,
        );
        map.insert(crate::DLC_LAYER_ID, &crate::link::LINK_LAYER_IMPLEMENTATION);
        SpinNoIrqLock::new(map)
    };
}

/// Register an implementation under its id; false when the id is taken by
/// a different implementation.
pub fn register_layer_implementation(implementation: &'static dyn LayerImplementation) -> bool {
    let mut registry = REGISTRY.lock();
    let id = implementation.id();
    if registry.contains_key(&id) {
        return false;
    }
    registry.insert(id, implementation);
    true
}

pub fn layer_implementation_by_id(id: LayerId) -> Option<&'static dyn LayerImplementation> {
    REGISTRY.lock().get(&id).copied()
}
