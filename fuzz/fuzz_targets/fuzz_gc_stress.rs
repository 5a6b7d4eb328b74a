#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::objects::js_object::JsObject;
use rotor_core::objects::property::PropOpFlags;
use rotor_core::objects::value::JsValue;
use rotor_core::runtime::Runtime;

// Stress the handle protocol against the moving collector: build object
// graphs, drop roots through scope markers, collect at arbitrary points,
// and verify that every still-rooted object resolves with its properties
// intact.
//
// Each operation is one byte:
//   bits [1:0] == 0 – allocate an object rooted in the keeper set
//   bits [1:0] == 1 – allocate garbage inside a flushed scope
//   bits [1:0] == 2 – link two keepers via a property edge
//   bits [1:0] == 3 – run a full collection
//   bits [7:2]      – operand selecting keepers / payload
fuzz_target!(|data: &[u8]| {
    let mut rt = Runtime::new();
    let mut keepers = Vec::new();

    const MAX_KEEPERS: usize = 32;

    for &byte in data {
        let operand = usize::from(byte >> 2);
        match byte & 0x3 {
            0 => {
                if keepers.len() < MAX_KEEPERS {
                    let obj = JsObject::create(&mut rt, None);
                    let tag = rt.intern("tag");
                    let v = rt.make_handle(JsValue::Smi(keepers.len() as i32));
                    JsObject::put_named(&mut rt, obj, tag, v, PropOpFlags::empty()).unwrap();
                    keepers.push((obj, keepers.len() as i32));
                }
            }
            1 => {
                // Unrooted allocations must be reclaimable.
                let mark = rt.handle_mark();
                for _ in 0..(operand % 8) + 1 {
                    JsObject::create(&mut rt, None);
                }
                rt.flush_handles(mark);
            }
            2 => {
                if keepers.len() >= 2 {
                    let (from, _) = keepers[operand % keepers.len()];
                    let (to, _) = keepers[(operand / 2) % keepers.len()];
                    let edge = rt.intern("edge");
                    let to_value = rt.handle_value(to);
                    let v = rt.make_handle(to_value);
                    JsObject::put_named(&mut rt, from, edge, v, PropOpFlags::empty()).unwrap();
                }
            }
            _ => {
                rt.collect();
            }
        }
    }

    rt.collect();

    // Every keeper must still resolve and carry its tag.
    let tag = rt.intern("tag");
    for &(obj, expected) in &keepers {
        let read = JsObject::get_named(&mut rt, obj, tag, PropOpFlags::empty(), None)
            .expect("rooted objects stay readable");
        assert_eq!(
            read,
            JsValue::Smi(expected),
            "a rooted object lost its property after collection"
        );
    }
});
