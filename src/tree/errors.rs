use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("missing type ({type_name}){hint}")]
    MissingType { type_name: String, hint: String },

    #[error("type '{type_name}' is abstract and cannot be instantiated")]
    AbstractType { type_name: String },

    #[error("'{node_type}' has no field '{field}'")]
    UnknownField { node_type: String, field: String },

    #[error("field '{field}' of '{node_type}' is a list; mutate its contents instead")]
    ListField { node_type: String, field: String },

    #[error("field '{field}' of '{node_type}' is not a list")]
    NotAList { node_type: String, field: String },

    #[error("invalid value ({value}) for {field} in {node_type}, expected {accepts}")]
    InvalidValue {
        node_type: String,
        field: String,
        value: String,
        accepts: String,
    },

    #[error("invalid list item ({value}) on {list}, expected {accepts}")]
    InvalidListItem {
        list: String,
        value: String,
        accepts: String,
    },

    #[error("attaching {child} under {parent} would make it its own ancestor")]
    Cycle { child: String, parent: String },

    #[error("record without a type tag: {record}")]
    UntaggedRecord { record: String },

    #[error("unsupported value in {context}: {value}")]
    UnsupportedValue { context: String, value: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
