pub mod mock_chat;
