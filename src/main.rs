#[macro_use]
extern crate rocket;

#[launch]
fn rocket() -> _ {
    ork_arena::rocket_initialize()
}
