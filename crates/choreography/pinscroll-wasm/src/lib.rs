use js_sys::Function;
use log::warn;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use pinscroll_core::{
    Choreographer, Config, Inputs, Outputs, SectionId, SectionLayout, SectionTargets, Viewport,
};

#[wasm_bindgen]
pub struct PinScroll {
    core: Choreographer,
    listener: Option<Function>,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn parse_or_default<T>(value: JsValue, what: &str) -> Result<T, JsError>
where
    T: Default + serde::de::DeserializeOwned,
{
    if jsvalue_is_undefined_or_null(&value) {
        Ok(T::default())
    } else {
        swb::from_value(value).map_err(|e| JsError::new(&format!("{what} error: {e}")))
    }
}

#[wasm_bindgen]
impl PinScroll {
    /// Create a choreographer for one page. Pass a JSON config object (or undefined/null
    /// for defaults) and the current viewport `{ height, max_scroll }`.
    /// Example:
    ///   new PinScroll({ scrub_lag: 0.6 }, { height: innerHeight, max_scroll })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, viewport: JsValue) -> Result<PinScroll, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = parse_or_default(config, "config")?;
        let viewport: Viewport = parse_or_default(viewport, "viewport")?;
        let core = Choreographer::new(cfg, viewport)
            .map_err(|e| JsError::new(&format!("config error: {e}")))?;
        Ok(PinScroll {
            core,
            listener: None,
        })
    }

    /// Mount a section. `layout` is `{ kind: "standard", panel_position }` or
    /// `{ kind: "hero" }` (undefined means standard/left); `targets` carries the element
    /// handles. Returns the section id (u32).
    #[wasm_bindgen(js_name = mount_section)]
    pub fn mount_section(
        &mut self,
        layout: JsValue,
        targets: JsValue,
        scroll_start: f32,
    ) -> Result<u32, JsError> {
        let layout: SectionLayout = parse_or_default(layout, "layout")?;
        let targets: SectionTargets = swb::from_value(targets)
            .map_err(|e| JsError::new(&format!("targets error: {e}")))?;
        let id = self
            .core
            .mount_section(layout, &targets, scroll_start)
            .map_err(|e| JsError::new(&format!("mount_section: {e}")))?;
        Ok(id.0)
    }

    #[wasm_bindgen(js_name = unmount_section)]
    pub fn unmount_section(&mut self, section_id: u32) -> Result<(), JsError> {
        self.core
            .unmount_section(SectionId(section_id))
            .map_err(|e| JsError::new(&format!("unmount_section: {e}")))
    }

    /// Report a section's new pin start after the layout shifted.
    #[wasm_bindgen(js_name = relayout_section)]
    pub fn relayout_section(&mut self, section_id: u32, scroll_start: f32) -> Result<(), JsError> {
        self.core
            .relayout_section(SectionId(section_id), scroll_start)
            .map_err(|e| JsError::new(&format!("relayout_section: {e}")))
    }

    /// Register a callback invoked once per emitted event after each update.
    /// Pass undefined/null to remove it.
    #[wasm_bindgen(js_name = set_event_listener)]
    pub fn set_event_listener(&mut self, listener: JsValue) {
        self.listener = listener.dyn_into::<Function>().ok();
    }

    /// Step by dt (seconds) with inputs JSON (`{ commands: [...] }`). Returns Outputs JSON.
    #[wasm_bindgen]
    pub fn update(&mut self, dt: f32, inputs_json: JsValue) -> Result<JsValue, JsError> {
        let inputs: Inputs = parse_or_default(inputs_json, "inputs")?;
        let out: &Outputs = self.core.update(dt, inputs);
        if let Some(f) = &self.listener {
            for ev in &out.events {
                let value = swb::to_value(ev)
                    .map_err(|e| JsError::new(&format!("event error: {e}")))?;
                if let Err(err) = f.call1(&JsValue::UNDEFINED, &value) {
                    warn!("event listener threw: {err:?}");
                }
            }
        }
        swb::to_value(out).map_err(|e| JsError::new(&format!("outputs error: {e}")))
    }

    /// Same as `update` with string JSON in and out, for hosts that batch through workers.
    #[wasm_bindgen(js_name = update_json)]
    pub fn update_json(&mut self, dt: f32, inputs_json: &str) -> Result<String, JsError> {
        let inputs: Inputs = if inputs_json.trim().is_empty() {
            Inputs::default()
        } else {
            serde_json::from_str(inputs_json)
                .map_err(|e| JsError::new(&format!("inputs error: {e}")))?
        };
        let out = self.core.update(dt, inputs);
        serde_json::to_string(out).map_err(|e| JsError::new(&format!("outputs error: {e}")))
    }

    /// Snap decision for a normalized scroll value, `{ kind: "free" | "snap", ... }`.
    #[wasm_bindgen(js_name = resolve_snap)]
    pub fn resolve_snap(&self, value: f32) -> Result<JsValue, JsError> {
        swb::to_value(&self.core.resolve_snap(value))
            .map_err(|e| JsError::new(&format!("snap error: {e}")))
    }

    #[wasm_bindgen(js_name = is_snap_installed)]
    pub fn is_snap_installed(&self) -> bool {
        self.core.is_snap_installed()
    }

    #[wasm_bindgen(js_name = section_count)]
    pub fn section_count(&self) -> usize {
        self.core.sections().len()
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
