mod pair;
mod services;

pub use pair::TestPair;
pub use services::{CalculatorService, ParkedCall, ParkingService};

use parlor_shared::{FieldDescriptor, ObjectSchema, Value};

/// The schema most scenarios use: one scalar, one keyed set, one
/// ordered list.
pub fn game_schema() -> ObjectSchema {
    ObjectSchema::new(vec![
        FieldDescriptor::scalar("score", Value::Int(0)),
        FieldDescriptor::set("players"),
        FieldDescriptor::list("board"),
    ])
}
