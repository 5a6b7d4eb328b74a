#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::objects::js_array::JsArray;
use rotor_core::objects::js_object::JsObject;
use rotor_core::objects::property::{DefinePropertyFlags, PropOpFlags};
use rotor_core::objects::value::JsValue;
use rotor_core::runtime::Runtime;

// Fuzz random property `put` / `get` / `delete` / `define` operations on a
// plain object and an array, and verify that class transitions, dictionary
// conversion, and the indexed↔named interplay never leave either object in
// an inconsistent state.
//
// Each operation is encoded in two bytes:
//   byte 0  bits [2:0] – operation selector
//           bits [7:3] – value payload (interpreted as Smi)
//   byte 1  bits [3:0] – property key index k0–k15
//           bit  [4]   – receiver selector (0 = object, 1 = array)
//           bits [7:5] – element index 0–7
//
// The small bounded key space makes the fuzzer quickly exercise shape
// sharing, the dictionary conversion on delete, spills past the direct
// slots, and index-like named properties on the array.
fuzz_target!(|data: &[u8]| {
    let mut rt = Runtime::new();
    let object = JsObject::create(&mut rt, None);
    let array = JsArray::create(&mut rt, None, 0);

    const MAX_OPS: usize = 256;
    let mut ops = 0;

    for chunk in data.chunks_exact(2) {
        if ops >= MAX_OPS {
            break;
        }
        ops += 1;

        let op = chunk[0] & 0x7;
        let smi_val = i32::from(chunk[0] >> 3);
        let key_idx = chunk[1] & 0xf;
        let receiver = if chunk[1] & 0x10 == 0 { object } else { array };
        let elem_idx = u32::from(chunk[1] >> 5);

        let key = format!("k{key_idx}");
        let mark = rt.handle_mark();

        match op {
            0 => {
                // [[Set]]: read-only properties fail; the status is
                // irrelevant, the operation must not panic.
                let name = rt.intern(&key);
                let v = rt.make_handle(JsValue::Smi(smi_val));
                let _ = JsObject::put_named(&mut rt, receiver, name, v, PropOpFlags::empty());
            }
            1 => {
                // [[Get]]: either a value or undefined.
                let name = rt.intern(&key);
                let _ = JsObject::get_named(&mut rt, receiver, name, PropOpFlags::empty(), None);
            }
            2 => {
                // [[Delete]]: non-configurable properties return false.
                let name = rt.intern(&key);
                let _ = JsObject::delete_named(&mut rt, receiver, name, PropOpFlags::empty());
            }
            3 => {
                // [[DefineOwnProperty]] with attributes from the payload.
                let name = rt.intern(&key);
                let v = rt.make_handle(JsValue::Smi(smi_val));
                let dpf = DefinePropertyFlags {
                    set_value: true,
                    writable: smi_val & 1 != 0,
                    set_writable: true,
                    enumerable: smi_val & 2 != 0,
                    set_enumerable: true,
                    configurable: smi_val & 4 != 0,
                    set_configurable: true,
                    ..DefinePropertyFlags::default()
                };
                let _ = JsObject::define_own_property(
                    &mut rt,
                    receiver,
                    name,
                    dpf,
                    v,
                    PropOpFlags::empty(),
                );
            }
            4 => {
                // Computed put of an integer key.
                let v = rt.make_handle(JsValue::Smi(smi_val));
                let _ = JsObject::put_computed(
                    &mut rt,
                    receiver,
                    &JsValue::Smi(elem_idx as i32),
                    v,
                    PropOpFlags::empty(),
                );
            }
            5 => {
                // Computed get through both spellings of the index.
                let _ = JsObject::get_computed(&mut rt, receiver, &JsValue::Smi(elem_idx as i32));
                let _ = JsObject::get_computed(
                    &mut rt,
                    receiver,
                    &JsValue::String(elem_idx.to_string()),
                );
            }
            6 => {
                // Computed delete; also removes index-like named shadows.
                let _ = JsObject::delete_computed(
                    &mut rt,
                    receiver,
                    &JsValue::Smi(elem_idx as i32),
                    PropOpFlags::empty(),
                );
            }
            _ => {
                // Computed define that may demote an index to a named
                // property when the attributes are not fully indexable.
                let v = rt.make_handle(JsValue::Smi(smi_val));
                let dpf = DefinePropertyFlags {
                    set_value: true,
                    writable: smi_val & 1 != 0,
                    set_writable: true,
                    enumerable: true,
                    set_enumerable: true,
                    configurable: smi_val & 4 != 0,
                    set_configurable: true,
                    ..DefinePropertyFlags::default()
                };
                let _ = JsObject::define_own_computed(
                    &mut rt,
                    receiver,
                    &JsValue::Smi(elem_idx as i32),
                    dpf,
                    v,
                    PropOpFlags::empty(),
                );
            }
        }

        rt.flush_handles(mark);
    }

    // Post-conditions on both receivers.
    for receiver in [object, array] {
        // hasNamed must agree with descriptor resolution for every key in
        // the fuzzed key space.
        for key_idx in 0..16 {
            let name = rt.intern(&format!("k{key_idx}"));
            let has = JsObject::has_named(&mut rt, receiver, name).unwrap();
            let desc = JsObject::get_named_descriptor(&mut rt, receiver, name).unwrap();
            assert_eq!(has, desc.is_some(), "hasNamed must match descriptor lookup");
        }
        // Enumeration must not panic and must not report the hole sentinel.
        let names = JsObject::get_own_property_names(&mut rt, receiver, false).unwrap();
        for name in &names {
            assert!(!name.is_empty(), "enumerated names must be real values");
        }
    }

    // Everything above stayed rooted; a full collection must not lose it.
    rt.collect();
    let _ = JsObject::get_own_property_names(&mut rt, object, false).unwrap();
    let _ = JsObject::get_own_property_names(&mut rt, array, false).unwrap();
});
