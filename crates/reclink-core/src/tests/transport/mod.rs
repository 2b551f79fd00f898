mod websocket;
