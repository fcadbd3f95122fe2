pub mod storyboard;
