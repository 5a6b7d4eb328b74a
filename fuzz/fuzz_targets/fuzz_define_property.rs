#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::objects::js_object::JsObject;
use rotor_core::objects::property::{DefinePropertyFlags, PropOpFlags, PropertyFlags};
use rotor_core::objects::value::JsValue;
use rotor_core::runtime::Runtime;

// Fuzz sequences of `defineOwnProperty` calls against the §8.12.9 update
// rule and check the one-way doors it guarantees:
//
//   * a property that became non-configurable never becomes configurable,
//   * a non-configurable property never changes enumerability,
//   * a non-configurable non-writable data property never becomes writable.
//
// Each operation is encoded in one byte:
//   bits [1:0] – property key index k0–k3
//   bit  [2]   – writable        (always mentioned)
//   bit  [3]   – enumerable      (always mentioned)
//   bit  [4]   – configurable    (always mentioned)
//   bits [7:5] – value payload (Smi)
fuzz_target!(|data: &[u8]| {
    let mut rt = Runtime::new();
    let obj = JsObject::create(&mut rt, None);

    const MAX_OPS: usize = 128;

    for (ops, &byte) in data.iter().enumerate() {
        if ops >= MAX_OPS {
            break;
        }
        let key_idx = byte & 0x3;
        let writable = byte & 0x04 != 0;
        let enumerable = byte & 0x08 != 0;
        let configurable = byte & 0x10 != 0;
        let value = i32::from(byte >> 5);

        let name = rt.intern(&format!("k{key_idx}"));
        let before = {
            let ptr = rt.handle_value(obj).as_object().unwrap();
            JsObject::lookup_own_property(&rt, ptr, name)
        };

        let mark = rt.handle_mark();
        let v = rt.make_handle(JsValue::Smi(value));
        let dpf = DefinePropertyFlags {
            set_value: true,
            writable,
            set_writable: true,
            enumerable,
            set_enumerable: true,
            configurable,
            set_configurable: true,
            ..DefinePropertyFlags::default()
        };
        let accepted =
            JsObject::define_own_property(&mut rt, obj, name, dpf, v, PropOpFlags::empty())
                .expect("throwOnError is off; defines never raise");
        rt.flush_handles(mark);

        let after = {
            let ptr = rt.handle_value(obj).as_object().unwrap();
            JsObject::lookup_own_property(&rt, ptr, name).expect("defined at least once")
        };

        if let Some(before) = before {
            let was_configurable = before.flags.contains(PropertyFlags::CONFIGURABLE);
            let is_configurable = after.flags.contains(PropertyFlags::CONFIGURABLE);
            assert!(
                was_configurable || !is_configurable,
                "non-configurable may never become configurable"
            );
            if !was_configurable {
                assert_eq!(
                    before.flags.contains(PropertyFlags::ENUMERABLE),
                    after.flags.contains(PropertyFlags::ENUMERABLE),
                    "non-configurable enumerability is frozen"
                );
                if !before.flags.contains(PropertyFlags::WRITABLE) {
                    assert!(
                        !after.flags.contains(PropertyFlags::WRITABLE),
                        "non-writable cannot be promoted on a non-configurable property"
                    );
                }
            }
            if !was_configurable
                && (configurable
                    || enumerable != before.flags.contains(PropertyFlags::ENUMERABLE))
            {
                assert!(!accepted, "the update rule must reject this change");
            }
        } else {
            assert!(accepted, "adding to an extensible object succeeds");
        }

        // The stored value always reflects the last accepted define.
        if accepted {
            let read = JsObject::get_named(&mut rt, obj, name, PropOpFlags::empty(), None)
                .expect("data reads cannot raise");
            assert_eq!(read, JsValue::Smi(value));
        }
    }
});
