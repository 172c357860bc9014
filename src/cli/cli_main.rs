use super::cli_burn::{burn_menu, prompt};
use crate::NuclearKinetics::rate_library::RateTable;
use crate::NuclearKinetics::reaction_network::NetworkModel;

pub fn run_interactive_menu() {
    loop {
        show_main_menu();
        let choice = prompt("\x1b[36mEnter your choice: \x1b[0m");

        match choice.trim() {
            "1" => burn_menu(),
            "2" => {
                NetworkModel::new().pretty_print_reactions();
                RateTable::new(1.5e7).pretty_print();
            }
            "0" | "" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - Welcome header text
Yellow (\x1b[33m) - Menu options
Cyan (\x1b[36m) - "Enter your choice:" prompt
Reset (\x1b[0m)
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n CNOnet: 13-isotope CNO-cycle reaction network\n
    stiff burning of H1 into He4 at fixed temperature and density \n \x1b[0m"
    );
    println!("\x1b[33m1. CNO burning\x1b[0m");
    println!("\x1b[33m2. Network overview at T = 1.5e7 K\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
}
