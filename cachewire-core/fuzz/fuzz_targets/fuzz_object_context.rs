#![no_main]

use std::any::Any;

use libfuzzer_sys::fuzz_target;

use cachewire_core::serialization::{
    DataInput, DataOutput, DataSerializableFactory, FactoryRegistry, IdentifiedDataSerializable,
};
use cachewire_core::{CacheObjectContext, IdentifiedObjectContext, Result};

#[derive(Debug, Default)]
struct Record {
    name: String,
    count: i64,
    flag: bool,
}

impl IdentifiedDataSerializable for Record {
    fn factory_id(&self) -> i32 {
        1
    }

    fn class_id(&self) -> i32 {
        1
    }

    fn write_data(&self, output: &mut dyn DataOutput) -> Result<()> {
        output.write_string(&self.name)?;
        output.write_long(self.count)?;
        output.write_bool(self.flag)
    }

    fn read_data(&mut self, input: &mut dyn DataInput) -> Result<()> {
        self.name = input.read_string()?;
        self.count = input.read_long()?;
        self.flag = input.read_bool()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct RecordFactory;

impl DataSerializableFactory for RecordFactory {
    fn create(&self, class_id: i32) -> Option<Box<dyn IdentifiedDataSerializable>> {
        (class_id == 1).then(|| Box::new(Record::default()) as Box<dyn IdentifiedDataSerializable>)
    }
}

fuzz_target!(|data: &[u8]| {
    let registry = FactoryRegistry::new().with_factory(1, Box::new(RecordFactory));
    let ctx = IdentifiedObjectContext::new();

    if let Ok(object) = ctx.decode(data, &registry) {
        let encoded = ctx.encode(object.as_ref()).expect("decoded object must encode");
        assert_eq!(encoded.len(), ctx.encoded_length(object.as_ref()).unwrap());
    }
});
