use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }

    /// The nil identity stands for "nobody" on a ride record and may never act.
    pub fn is_anonymous(&self) -> bool {
        self.id.is_nil()
    }

    fn id_equals(&self, id: Uuid) -> bool {
        self.id == id
    }

    fn id_equals_nullable_id(&self, optional_id: Option<Uuid>) -> bool {
        if let Some(id) = optional_id {
            if self.id == id {
                return true;
            }
        }

        false
    }
}

impl PolarClass for User {
    fn get_polar_class_builder() -> oso::ClassBuilder<User> {
        oso::Class::builder()
            .name("User")
            .add_attribute_getter("id", |recv: &User| recv.id)
            .add_method("is_anonymous", User::is_anonymous)
            .add_method("id_equals", User::id_equals)
            .add_method("id_equals_nullable_id", User::id_equals_nullable_id)
    }

    fn get_polar_class() -> oso::Class {
        let builder = User::get_polar_class_builder();
        builder.build()
    }
}

#[test]
fn user_identity_test() {
    let user = User::new(Uuid::new_v4());

    assert!(!user.is_anonymous());
    assert!(User::new(Uuid::nil()).is_anonymous());

    assert!(user.id_equals(user.id));
    assert!(!user.id_equals(Uuid::new_v4()));

    assert!(user.id_equals_nullable_id(Some(user.id)));
    assert!(!user.id_equals_nullable_id(Some(Uuid::new_v4())));
    assert!(!user.id_equals_nullable_id(None));
}
