//! `LocalWorker`: the key state machine exposed to a browser Web Worker.
//!
//! ```js
//! import init, { LocalWorker } from "votera-wasm";
//! await init();
//! const worker = new LocalWorker();
//! self.onmessage = (e) => self.postMessage(worker.handleMessage(e.data));
//! ```

use serde_json::Value;
use votera_worker::{KeyState, WireMessage, WorkerConfig, WorkerError};
use wasm_bindgen::prelude::*;

use crate::error::{to_js_error, to_js_value};

#[wasm_bindgen]
pub struct LocalWorker {
    state: KeyState,
}

#[wasm_bindgen]
impl LocalWorker {
    /// Create a worker. `config` is an optional `{ kdf: { log_n, r, p }, decrypt_failure }` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<LocalWorker, JsValue> {
        console_error_panic_hook::set_once();
        let config: WorkerConfig = if config.is_undefined() || config.is_null() {
            WorkerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        config.validate().map_err(to_js_error)?;
        Ok(Self {
            state: KeyState::new(config),
        })
    }

    /// Create a worker from a TOML config string.
    #[wasm_bindgen(js_name = "fromToml")]
    pub fn from_toml(config: &str) -> Result<LocalWorker, JsValue> {
        console_error_panic_hook::set_once();
        let config = WorkerConfig::from_toml_str(config).map_err(to_js_error)?;
        Ok(Self {
            state: KeyState::new(config),
        })
    }

    /// Handle one `{type, id, data1, data2}` message and return the response object.
    #[wasm_bindgen(js_name = "handleMessage")]
    pub fn handle_message(&mut self, message: JsValue) -> Result<JsValue, JsValue> {
        let value: Value = serde_wasm_bindgen::from_value(message).map_err(to_js_error)?;
        let reply = dispatch_value(&mut self.state, value).map_err(to_js_error)?;
        to_js_value(&reply)
    }

    /// Same as `handleMessage` for hosts that post JSON strings.
    #[wasm_bindgen(js_name = "handleJson")]
    pub fn handle_json(&mut self, message: &str) -> Result<String, JsValue> {
        dispatch_json(&mut self.state, message).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = "isKeyed")]
    pub fn is_keyed(&self) -> bool {
        self.state.is_keyed()
    }
}

pub(crate) fn dispatch_json(state: &mut KeyState, message: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(message)?;
    serde_json::to_string(&dispatch_value(state, value)?)
}

/// Handle a loosely typed message. A message whose fields have the wrong
/// types still gets an `ERROR` reply as long as its `id` is readable.
fn dispatch_value(state: &mut KeyState, value: Value) -> Result<WireMessage, serde_json::Error> {
    let id = value.get("id").and_then(Value::as_u64);
    match serde_json::from_value::<WireMessage>(value) {
        Ok(msg) => Ok(state.handle_wire(msg)),
        Err(e) => match id {
            Some(id) => Ok(WireMessage::error(id, &WorkerError::BadParameter(e.to_string()))),
            None => Err(e),
        },
    }
}
