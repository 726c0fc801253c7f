pub use crate::{
    input::{DecisionInput, Payload},
    keys::{
        paths, AbacType, AbacVerb, ABAC_TYPE_KEY, ABAC_VERB_KEY, AUTHORIZATION_HEADER,
        ENTITLED_FEATURES_KEY, NO_REQUEST_ID, OBLIGATIONS_KEY, SET_AUTHORIZATION_HEADER,
    },
    metadata::Metadata,
    scope::RequestScope,
};
